//! Tax-loss harvesting saga.
//!
//! Five steps: identify lots with harvestable losses, screen them against
//! the wash-sale rule, sell the survivors, reinvest the proceeds into
//! replacement securities, then write the tax records. The replacement
//! purchase is the pivot; once replacements fill, the harvested sales are
//! kept even if record keeping fails.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use saga_engine::{
    Fingerprint, SagaContext, SagaListener, SagaOrchestrator, SagaResult, TransactionStep,
};

use crate::error::WorkflowError;
use crate::providers::SimulatedBroker;
use crate::traits::BrokerProvider;
use crate::types::{HistoricalTransaction, HoldingPeriod, OrderFill, TaxLot, TradeAction};
use crate::wash_sale::{self, WashSaleViolation};

/// Default minimum unrealized loss, in dollars, for a lot to qualify.
pub const DEFAULT_MIN_LOSS_THRESHOLD: f64 = 100.0;

/// A lot whose unrealized loss clears the harvesting threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LossOpportunity {
    pub lot_id: String,
    pub asset: String,
    pub quantity: f64,
    pub current_price: f64,
    pub cost_basis: f64,
    pub current_value: f64,
    pub unrealized_gain_loss: f64,
    pub holding_period: HoldingPeriod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wash_sale_violation: Option<WashSaleViolation>,
}

impl LossOpportunity {
    fn from_lot(lot: &TaxLot, as_of: DateTime<Utc>) -> Self {
        Self {
            lot_id: lot.lot_id.clone(),
            asset: lot.asset.clone(),
            quantity: lot.quantity,
            current_price: lot.current_price,
            cost_basis: lot.cost_basis(),
            current_value: lot.current_value(),
            unrealized_gain_loss: lot.unrealized_gain_loss(),
            holding_period: lot.holding_period(as_of),
            wash_sale_violation: None,
        }
    }
}

/// A loss sale that actually went to the broker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestSale {
    pub order_id: String,
    pub lot_id: String,
    pub asset: String,
    pub quantity: f64,
    pub proceeds: f64,
    pub cost_basis: f64,
    pub realized_loss: f64,
    pub holding_period: HoldingPeriod,
}

/// Replacement security bought with the proceeds of a harvested sale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementPurchase {
    pub order_id: String,
    pub asset: String,
    pub original_asset: String,
    pub amount: f64,
}

/// Proceeds parked as cash when no replacement exists for the sold asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeptAsCash {
    pub original_asset: String,
    pub amount: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRecordStatus {
    Recorded,
    Reverted,
}

/// One realized-loss entry for the tax year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxRecord {
    pub record_id: String,
    pub tax_year: i32,
    pub asset_sold: String,
    pub lot_id: String,
    pub quantity: f64,
    pub proceeds: f64,
    pub cost_basis: f64,
    pub realized_loss: f64,
    pub holding_period: HoldingPeriod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_cost: Option<f64>,
    pub status: TaxRecordStatus,
}

/// Totals reported after a completed harvest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestSummary {
    pub total_losses_harvested: f64,
    pub total_reinvested: f64,
    pub positions_harvested: usize,
    pub replacements_purchased: usize,
    pub tax_year: i32,
}

/// Mutable state threaded through a harvest run.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestData {
    pub tax_lots: Vec<TaxLot>,
    pub transaction_history: Vec<HistoricalTransaction>,
    /// Valuation date for holding periods and the wash-sale window.
    pub as_of: DateTime<Utc>,
    /// Demo hook: makes the replacement step fail so the rollback path is
    /// observable without a real broker outage.
    #[serde(skip)]
    pub simulate_replacement_failure: bool,

    pub opportunities: Vec<LossOpportunity>,
    pub total_potential_loss: f64,
    pub status_message: String,
    pub wash_sale_violations: Vec<LossOpportunity>,
    pub valid_opportunities: Vec<LossOpportunity>,
    pub executed_sells: Vec<HarvestSale>,
    pub total_proceeds: f64,
    pub harvested_losses: f64,
    pub available_for_reinvestment: f64,
    pub replacement_purchases: Vec<ReplacementPurchase>,
    pub kept_as_cash: Vec<KeptAsCash>,
    pub total_reinvested: f64,
    pub remaining_cash: f64,
    pub tax_records: Vec<TaxRecord>,
    pub completed: bool,
    pub summary: Option<HarvestSummary>,
    /// Reversing buys placed while compensating the sell step.
    pub buyback_orders: Vec<OrderFill>,
    /// Reversing sells placed while compensating the replacement step.
    pub sellback_orders: Vec<OrderFill>,
}

impl HarvestData {
    #[must_use]
    pub fn new(tax_lots: Vec<TaxLot>, transaction_history: Vec<HistoricalTransaction>) -> Self {
        Self {
            tax_lots,
            transaction_history,
            as_of: Utc::now(),
            simulate_replacement_failure: false,
            opportunities: Vec::new(),
            total_potential_loss: 0.0,
            status_message: String::new(),
            wash_sale_violations: Vec::new(),
            valid_opportunities: Vec::new(),
            executed_sells: Vec::new(),
            total_proceeds: 0.0,
            harvested_losses: 0.0,
            available_for_reinvestment: 0.0,
            replacement_purchases: Vec::new(),
            kept_as_cash: Vec::new(),
            total_reinvested: 0.0,
            remaining_cash: 0.0,
            tax_records: Vec::new(),
            completed: false,
            summary: None,
            buyback_orders: Vec::new(),
            sellback_orders: Vec::new(),
        }
    }

    /// Pins the valuation date, useful for reproducible runs and tests.
    #[must_use]
    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = as_of;
        self
    }
}

impl Fingerprint for HarvestData {
    fn fingerprint(&self) -> String {
        let mut out = String::from("harvest");
        for lot in &self.tax_lots {
            let _ = write!(
                out,
                "|{}:{}:{}:{}:{}:{}",
                lot.lot_id,
                lot.asset,
                lot.purchase_date.to_rfc3339(),
                lot.purchase_price,
                lot.quantity,
                lot.current_price
            );
        }
        for transaction in &self.transaction_history {
            let _ = write!(
                out,
                "|{} {} {}",
                transaction.action,
                transaction.asset,
                transaction.date.to_rfc3339()
            );
        }
        out
    }
}

struct IdentifyLossesStep {
    min_loss_threshold: f64,
}

impl TransactionStep<HarvestData> for IdentifyLossesStep {
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "IdentifyLosses"
    }

    fn execute(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        let mut opportunities: Vec<LossOpportunity> = data
            .tax_lots
            .iter()
            .filter(|lot| lot.unrealized_gain_loss() < -self.min_loss_threshold)
            .map(|lot| LossOpportunity::from_lot(lot, data.as_of))
            .collect();
        // Largest loss first.
        opportunities.sort_by(|a, b| a.unrealized_gain_loss.total_cmp(&b.unrealized_gain_loss));
        data.total_potential_loss = opportunities
            .iter()
            .map(|opportunity| opportunity.unrealized_gain_loss)
            .sum();
        data.status_message = if opportunities.is_empty() {
            "no loss-harvesting opportunities above threshold".to_string()
        } else {
            format!(
                "found {} loss-harvesting opportunities totaling ${:.2} in losses",
                opportunities.len(),
                data.total_potential_loss.abs()
            )
        };
        debug!(
            candidates = opportunities.len(),
            potential_loss = data.total_potential_loss,
            "loss scan complete"
        );
        data.opportunities = opportunities;
        Ok(())
    }

    fn compensate(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        data.opportunities.clear();
        data.total_potential_loss = 0.0;
        data.status_message.clear();
        Ok(())
    }
}

struct CheckWashSaleStep;

impl TransactionStep<HarvestData> for CheckWashSaleStep {
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "CheckWashSale"
    }

    fn execute(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        let mut violations = Vec::new();
        let mut valid = Vec::new();
        for opportunity in data.opportunities.clone() {
            match wash_sale::find_violation(
                &opportunity.asset,
                &data.transaction_history,
                data.as_of,
            ) {
                Some(violation) => {
                    let mut flagged = opportunity;
                    flagged.wash_sale_violation = Some(violation);
                    violations.push(flagged);
                }
                None => valid.push(opportunity),
            }
        }
        if !violations.is_empty() {
            warn!(
                excluded = violations.len(),
                "positions excluded by the wash-sale rule"
            );
        }
        data.wash_sale_violations = violations;
        data.valid_opportunities = valid;
        if data.valid_opportunities.is_empty() {
            return Err(WorkflowError::NoValidOpportunities);
        }
        Ok(())
    }

    fn compensate(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        data.wash_sale_violations.clear();
        data.valid_opportunities.clear();
        Ok(())
    }
}

struct SellLossPositionsStep {
    broker: Arc<dyn BrokerProvider>,
}

impl TransactionStep<HarvestData> for SellLossPositionsStep {
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "SellLossPositions"
    }

    fn execute(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        let valid = data.valid_opportunities.clone();
        let mut sells = Vec::with_capacity(valid.len());
        let mut proceeds = 0.0;
        let mut losses = 0.0;
        for opportunity in &valid {
            let fill = self.broker.place_order(
                &opportunity.asset,
                TradeAction::Sell,
                opportunity.current_value,
            )?;
            sells.push(HarvestSale {
                order_id: fill.order_id,
                lot_id: opportunity.lot_id.clone(),
                asset: opportunity.asset.clone(),
                quantity: opportunity.quantity,
                proceeds: opportunity.current_value,
                cost_basis: opportunity.cost_basis,
                realized_loss: opportunity.unrealized_gain_loss,
                holding_period: opportunity.holding_period,
            });
            proceeds += opportunity.current_value;
            losses += opportunity.unrealized_gain_loss.abs();
        }
        debug!(sold = sells.len(), proceeds, losses, "loss positions sold");
        data.executed_sells = sells;
        data.total_proceeds = proceeds;
        data.harvested_losses = losses;
        data.available_for_reinvestment = proceeds;
        Ok(())
    }

    fn compensate(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        let mut buybacks = Vec::with_capacity(data.executed_sells.len());
        for sale in &data.executed_sells {
            let mut fill = self
                .broker
                .place_order(&sale.asset, TradeAction::Buy, sale.proceeds)?;
            fill.compensation_for = Some(sale.order_id.clone());
            buybacks.push(fill);
        }
        data.buyback_orders.extend(buybacks);
        data.executed_sells.clear();
        data.total_proceeds = 0.0;
        data.harvested_losses = 0.0;
        data.available_for_reinvestment = 0.0;
        Ok(())
    }
}

struct PurchaseReplacementStep {
    broker: Arc<dyn BrokerProvider>,
}

impl TransactionStep<HarvestData> for PurchaseReplacementStep {
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "PurchaseReplacement"
    }

    fn is_pivot(&self) -> bool {
        true
    }

    fn execute(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        if data.simulate_replacement_failure {
            return Err(WorkflowError::ReplacementUnavailable);
        }
        let sells = data.executed_sells.clone();
        let mut purchases = Vec::new();
        let mut kept = Vec::new();
        let mut invested = 0.0;
        for sale in &sells {
            match wash_sale::replacements_for(&sale.asset).first() {
                Some(replacement) => {
                    let fill =
                        self.broker
                            .place_order(replacement, TradeAction::Buy, sale.proceeds)?;
                    purchases.push(ReplacementPurchase {
                        order_id: fill.order_id,
                        asset: (*replacement).to_string(),
                        original_asset: sale.asset.clone(),
                        amount: sale.proceeds,
                    });
                    invested += sale.proceeds;
                }
                None => {
                    kept.push(KeptAsCash {
                        original_asset: sale.asset.clone(),
                        amount: sale.proceeds,
                        reason: "no suitable replacement security".to_string(),
                    });
                }
            }
        }
        debug!(
            replacements = purchases.len(),
            kept_as_cash = kept.len(),
            invested,
            "replacements placed"
        );
        data.replacement_purchases = purchases;
        data.kept_as_cash.extend(kept);
        data.total_reinvested = invested;
        data.remaining_cash = data.available_for_reinvestment - invested;
        Ok(())
    }

    fn compensate(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        let mut sellbacks = Vec::with_capacity(data.replacement_purchases.len());
        for purchase in &data.replacement_purchases {
            let mut fill =
                self.broker
                    .place_order(&purchase.asset, TradeAction::Sell, purchase.amount)?;
            fill.compensation_for = Some(purchase.order_id.clone());
            sellbacks.push(fill);
        }
        data.sellback_orders.extend(sellbacks);
        data.replacement_purchases.clear();
        data.total_reinvested = 0.0;
        Ok(())
    }
}

struct RecordTaxLotStep;

impl TransactionStep<HarvestData> for RecordTaxLotStep {
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "RecordTaxLot"
    }

    fn execute(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        let tax_year = data.as_of.year();
        let mut records = Vec::with_capacity(data.executed_sells.len());
        for sale in &data.executed_sells {
            let replacement = data
                .replacement_purchases
                .iter()
                .find(|purchase| purchase.original_asset == sale.asset);
            records.push(TaxRecord {
                record_id: format!("TAX_{}_{}", tax_year, sale.lot_id),
                tax_year,
                asset_sold: sale.asset.clone(),
                lot_id: sale.lot_id.clone(),
                quantity: sale.quantity,
                proceeds: sale.proceeds,
                cost_basis: sale.cost_basis,
                realized_loss: sale.realized_loss,
                holding_period: sale.holding_period,
                replacement_asset: replacement.map(|purchase| purchase.asset.clone()),
                replacement_cost: replacement.map(|purchase| purchase.amount),
                status: TaxRecordStatus::Recorded,
            });
        }
        data.tax_records = records;
        data.summary = Some(HarvestSummary {
            total_losses_harvested: data.harvested_losses,
            total_reinvested: data.total_reinvested,
            positions_harvested: data.executed_sells.len(),
            replacements_purchased: data.replacement_purchases.len(),
            tax_year,
        });
        data.completed = true;
        Ok(())
    }

    fn compensate(&self, data: &mut HarvestData) -> Result<(), WorkflowError> {
        // Records are retained but marked so downstream reporting skips them.
        for record in &mut data.tax_records {
            record.status = TaxRecordStatus::Reverted;
        }
        data.summary = None;
        data.completed = false;
        Ok(())
    }
}

/// Wires the five harvesting steps into an orchestrator.
pub struct TaxLossHarvestingSaga {
    orchestrator: SagaOrchestrator<HarvestData, WorkflowError>,
}

impl TaxLossHarvestingSaga {
    /// Default threshold and an always-filling simulated broker.
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_MIN_LOSS_THRESHOLD)
    }

    #[must_use]
    pub fn with_threshold(min_loss_threshold: f64) -> Self {
        Self::assemble(min_loss_threshold, Arc::new(SimulatedBroker::new()), None)
    }

    #[must_use]
    pub fn with_providers(min_loss_threshold: f64, broker: Arc<dyn BrokerProvider>) -> Self {
        Self::assemble(min_loss_threshold, broker, None)
    }

    /// Default broker plus a listener for step progress.
    #[must_use]
    pub fn with_listener(min_loss_threshold: f64, listener: Arc<dyn SagaListener>) -> Self {
        Self::assemble(
            min_loss_threshold,
            Arc::new(SimulatedBroker::new()),
            Some(listener),
        )
    }

    fn assemble(
        min_loss_threshold: f64,
        broker: Arc<dyn BrokerProvider>,
        listener: Option<Arc<dyn SagaListener>>,
    ) -> Self {
        let mut builder = SagaOrchestrator::builder()
            .step(IdentifyLossesStep { min_loss_threshold })
            .step(CheckWashSaleStep)
            .step(SellLossPositionsStep {
                broker: Arc::clone(&broker),
            })
            .step(PurchaseReplacementStep { broker })
            .step(RecordTaxLotStep);
        if let Some(listener) = listener {
            builder = builder.listener(listener);
        }
        Self {
            orchestrator: builder.build(),
        }
    }

    pub fn run(&self, data: HarvestData) -> SagaResult<HarvestData> {
        self.run_context(SagaContext::new(data))
    }

    pub fn run_context(&self, context: SagaContext<HarvestData>) -> SagaResult<HarvestData> {
        self.orchestrator.run(context)
    }

    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.orchestrator.step_names()
    }

    #[must_use]
    pub fn pivot_step(&self) -> Option<&'static str> {
        self.orchestrator.pivot_step()
    }
}

impl Default for TaxLossHarvestingSaga {
    fn default() -> Self {
        Self::new()
    }
}
