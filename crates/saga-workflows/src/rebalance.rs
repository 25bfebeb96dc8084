//! Portfolio rebalancing saga.
//!
//! Four steps: validate the market session, place the sell side, settle the
//! proceeds as buying power, then place the buy side. The buy step is the
//! pivot; once buys fill, earlier steps are never compensated.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use saga_engine::{
    Fingerprint, SagaContext, SagaListener, SagaOrchestrator, SagaResult, TransactionStep,
};

use crate::error::WorkflowError;
use crate::providers::{SimulatedBroker, SimulatedMarket};
use crate::traits::{BrokerProvider, MarketDataProvider, MarketStatus};
use crate::types::{OrderFill, PortfolioSnapshot, ProposedTrade, TradeAction};

/// Mutable state threaded through a rebalance run.
#[derive(Debug, Clone, Serialize)]
pub struct RebalanceData {
    pub portfolio: PortfolioSnapshot,
    pub proposed_trades: Vec<ProposedTrade>,
    /// Demo hook: makes the buy step fail so the rollback path is observable
    /// without a real broker outage.
    #[serde(skip)]
    pub simulate_buy_failure: bool,

    pub market_validated: bool,
    pub market_message: String,
    pub executed_sells: Vec<OrderFill>,
    pub sell_proceeds: f64,
    pub cash_settled: bool,
    pub available_cash: f64,
    pub executed_buys: Vec<OrderFill>,
    pub remaining_cash: f64,
    /// Reversing buys placed while compensating the sell step.
    pub buyback_orders: Vec<OrderFill>,
    /// Reversing sells placed while compensating the buy step.
    pub sellback_orders: Vec<OrderFill>,
}

impl RebalanceData {
    #[must_use]
    pub fn new(portfolio: PortfolioSnapshot, proposed_trades: Vec<ProposedTrade>) -> Self {
        Self {
            portfolio,
            proposed_trades,
            simulate_buy_failure: false,
            market_validated: false,
            market_message: String::new(),
            executed_sells: Vec::new(),
            sell_proceeds: 0.0,
            cash_settled: false,
            available_cash: 0.0,
            executed_buys: Vec::new(),
            remaining_cash: 0.0,
            buyback_orders: Vec::new(),
            sellback_orders: Vec::new(),
        }
    }
}

impl Fingerprint for RebalanceData {
    fn fingerprint(&self) -> String {
        let mut out = String::from("rebalance");
        for (asset, value) in &self.portfolio.holdings {
            let _ = write!(out, "|{asset}={value}");
        }
        let _ = write!(out, "|cash={}", self.portfolio.cash);
        for trade in &self.proposed_trades {
            let _ = write!(out, "|{} {} {}", trade.action, trade.asset, trade.amount);
        }
        out
    }
}

struct ValidateMarketStep {
    market: Arc<dyn MarketDataProvider>,
}

impl TransactionStep<RebalanceData> for ValidateMarketStep {
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "ValidateMarket"
    }

    fn execute(&self, data: &mut RebalanceData) -> Result<(), WorkflowError> {
        match self.market.market_status() {
            MarketStatus::Open => {
                data.market_validated = true;
                data.market_message = "market open, trading window confirmed".to_string();
                Ok(())
            }
            MarketStatus::Closed => Err(WorkflowError::MarketClosed),
        }
    }

    fn compensate(&self, data: &mut RebalanceData) -> Result<(), WorkflowError> {
        data.market_validated = false;
        data.market_message.clear();
        Ok(())
    }
}

struct PlaceSellOrdersStep {
    broker: Arc<dyn BrokerProvider>,
}

impl TransactionStep<RebalanceData> for PlaceSellOrdersStep {
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "PlaceSellOrders"
    }

    fn execute(&self, data: &mut RebalanceData) -> Result<(), WorkflowError> {
        let sell_trades: Vec<ProposedTrade> = data
            .proposed_trades
            .iter()
            .filter(|trade| trade.action == TradeAction::Sell)
            .cloned()
            .collect();
        let mut fills = Vec::with_capacity(sell_trades.len());
        for trade in &sell_trades {
            fills.push(
                self.broker
                    .place_order(&trade.asset, TradeAction::Sell, trade.amount)?,
            );
        }
        data.sell_proceeds = fills.iter().map(|fill| fill.fill_price).sum();
        debug!(
            orders = fills.len(),
            proceeds = data.sell_proceeds,
            "sell side filled"
        );
        data.executed_sells = fills;
        Ok(())
    }

    fn compensate(&self, data: &mut RebalanceData) -> Result<(), WorkflowError> {
        let mut buybacks = Vec::with_capacity(data.executed_sells.len());
        for sell in &data.executed_sells {
            let mut fill = self
                .broker
                .place_order(&sell.asset, TradeAction::Buy, sell.amount)?;
            fill.compensation_for = Some(sell.order_id.clone());
            buybacks.push(fill);
        }
        data.buyback_orders.extend(buybacks);
        // Cleared so a repeated compensation has nothing left to reverse.
        data.executed_sells.clear();
        data.sell_proceeds = 0.0;
        Ok(())
    }
}

struct SettleCashStep;

impl TransactionStep<RebalanceData> for SettleCashStep {
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "SettleCash"
    }

    fn execute(&self, data: &mut RebalanceData) -> Result<(), WorkflowError> {
        data.available_cash = data.sell_proceeds;
        data.cash_settled = true;
        Ok(())
    }

    fn compensate(&self, data: &mut RebalanceData) -> Result<(), WorkflowError> {
        data.available_cash = 0.0;
        data.cash_settled = false;
        Ok(())
    }
}

struct PlaceBuyOrdersStep {
    broker: Arc<dyn BrokerProvider>,
}

impl TransactionStep<RebalanceData> for PlaceBuyOrdersStep {
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "PlaceBuyOrders"
    }

    fn is_pivot(&self) -> bool {
        true
    }

    fn execute(&self, data: &mut RebalanceData) -> Result<(), WorkflowError> {
        let buy_trades: Vec<ProposedTrade> = data
            .proposed_trades
            .iter()
            .filter(|trade| trade.action == TradeAction::Buy)
            .cloned()
            .collect();
        let required: f64 = buy_trades.iter().map(|trade| trade.amount).sum();
        if data.simulate_buy_failure {
            return Err(WorkflowError::InsufficientFunds {
                required,
                available: data.available_cash,
            });
        }
        let mut fills = Vec::with_capacity(buy_trades.len());
        for trade in &buy_trades {
            fills.push(
                self.broker
                    .place_order(&trade.asset, TradeAction::Buy, trade.amount)?,
            );
        }
        data.remaining_cash = data.available_cash - required;
        debug!(orders = fills.len(), spent = required, "buy side filled");
        data.executed_buys = fills;
        Ok(())
    }

    fn compensate(&self, data: &mut RebalanceData) -> Result<(), WorkflowError> {
        let mut sellbacks = Vec::with_capacity(data.executed_buys.len());
        for buy in &data.executed_buys {
            let mut fill = self
                .broker
                .place_order(&buy.asset, TradeAction::Sell, buy.amount)?;
            fill.compensation_for = Some(buy.order_id.clone());
            sellbacks.push(fill);
        }
        data.sellback_orders.extend(sellbacks);
        data.executed_buys.clear();
        Ok(())
    }
}

/// Wires the four rebalance steps into an orchestrator.
pub struct RebalanceSaga {
    orchestrator: SagaOrchestrator<RebalanceData, WorkflowError>,
}

impl RebalanceSaga {
    /// Simulated open market and always-filling broker.
    #[must_use]
    pub fn new() -> Self {
        Self::assemble(
            Arc::new(SimulatedBroker::new()),
            Arc::new(SimulatedMarket::open()),
            None,
        )
    }

    #[must_use]
    pub fn with_providers(
        broker: Arc<dyn BrokerProvider>,
        market: Arc<dyn MarketDataProvider>,
    ) -> Self {
        Self::assemble(broker, market, None)
    }

    /// Default providers plus a listener for step progress.
    #[must_use]
    pub fn with_listener(listener: Arc<dyn SagaListener>) -> Self {
        Self::assemble(
            Arc::new(SimulatedBroker::new()),
            Arc::new(SimulatedMarket::open()),
            Some(listener),
        )
    }

    fn assemble(
        broker: Arc<dyn BrokerProvider>,
        market: Arc<dyn MarketDataProvider>,
        listener: Option<Arc<dyn SagaListener>>,
    ) -> Self {
        let mut builder = SagaOrchestrator::builder()
            .step(ValidateMarketStep { market })
            .step(PlaceSellOrdersStep {
                broker: Arc::clone(&broker),
            })
            .step(SettleCashStep)
            .step(PlaceBuyOrdersStep { broker });
        if let Some(listener) = listener {
            builder = builder.listener(listener);
        }
        Self {
            orchestrator: builder.build(),
        }
    }

    pub fn run(&self, data: RebalanceData) -> SagaResult<RebalanceData> {
        self.run_context(SagaContext::new(data))
    }

    pub fn run_context(&self, context: SagaContext<RebalanceData>) -> SagaResult<RebalanceData> {
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

impl Default for RebalanceSaga {
    fn default() -> Self {
        Self::new()
    }
}
