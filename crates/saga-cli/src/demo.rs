//! Built-in sample data the demo commands run against.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

use saga_workflows::harvest::HarvestData;
use saga_workflows::types::{
    HistoricalTransaction, PortfolioSnapshot, ProposedTrade, TaxLot, TradeAction,
};

pub(crate) fn portfolio() -> PortfolioSnapshot {
    let mut holdings = IndexMap::new();
    holdings.insert("AAPL".to_string(), 25_000.0);
    holdings.insert("MSFT".to_string(), 20_000.0);
    holdings.insert("GOOGL".to_string(), 15_000.0);
    holdings.insert("BND".to_string(), 20_000.0);
    holdings.insert("TLT".to_string(), 10_000.0);
    holdings.insert("GLD".to_string(), 2_000.0);
    PortfolioSnapshot {
        holdings,
        cash: 8_000.0,
    }
}

/// Trims the overweight tech names and tops up bonds and gold.
pub(crate) fn proposed_trades() -> Vec<ProposedTrade> {
    vec![
        ProposedTrade::new("AAPL", TradeAction::Sell, 5_000.0),
        ProposedTrade::new("MSFT", TradeAction::Sell, 3_000.0),
        ProposedTrade::new("BND", TradeAction::Buy, 6_000.0),
        ProposedTrade::new("GLD", TradeAction::Buy, 2_000.0),
    ]
}

fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

fn lot(lot_id: &str, asset: &str, held_days: i64, price: f64, quantity: f64, current: f64) -> TaxLot {
    TaxLot {
        lot_id: lot_id.to_string(),
        asset: asset.to_string(),
        purchase_date: days_ago(held_days),
        purchase_price: price,
        quantity,
        current_price: current,
    }
}

/// Lots covering the interesting harvest cases: a large long-term ETF loss,
/// a washed ETF loss, a single-name loss with no replacement, and a gain.
pub(crate) fn tax_lots() -> Vec<TaxLot> {
    vec![
        lot("LOT-VTI-001", "VTI", 730, 250.0, 40.0, 230.0),
        lot("LOT-IVV-001", "IVV", 120, 500.0, 4.0, 400.0),
        lot("LOT-AAPL-001", "AAPL", 200, 190.0, 40.0, 175.0),
        lot("LOT-SPY-001", "SPY", 900, 400.0, 10.0, 500.0),
        lot("LOT-BND-001", "BND", 400, 80.0, 150.0, 78.0),
    ]
}

/// A recent SPY purchase washes the IVV lot above.
pub(crate) fn transaction_history() -> Vec<HistoricalTransaction> {
    vec![
        HistoricalTransaction {
            asset: "SPY".to_string(),
            action: TradeAction::Buy,
            date: days_ago(8),
        },
        HistoricalTransaction {
            asset: "TLT".to_string(),
            action: TradeAction::Sell,
            date: days_ago(20),
        },
    ]
}

pub(crate) fn harvest_data() -> HarvestData {
    HarvestData::new(tax_lots(), transaction_history())
}
