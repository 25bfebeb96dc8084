//! Domain types shared by the portfolio sagas.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Lots held for at least this many days qualify for long-term treatment.
pub const LONG_TERM_HOLDING_DAYS: i64 = 365;

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A dollar-denominated trade a saga intends to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedTrade {
    pub asset: String,
    pub action: TradeAction,
    /// Notional amount in dollars.
    pub amount: f64,
}

impl ProposedTrade {
    #[must_use]
    pub fn new(asset: impl Into<String>, action: TradeAction, amount: f64) -> Self {
        Self {
            asset: asset.into(),
            action,
            amount,
        }
    }
}

/// Point-in-time view of a portfolio, keyed by ticker in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub holdings: IndexMap<String, f64>,
    pub cash: f64,
}

impl PortfolioSnapshot {
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.holdings.values().sum::<f64>() + self.cash
    }
}

/// A filled order as reported by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    pub order_id: String,
    pub asset: String,
    pub side: TradeAction,
    pub amount: f64,
    pub fill_price: f64,
    /// Present when this fill reverses an earlier order during rollback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compensation_for: Option<String>,
}

/// Tax treatment of a realized gain or loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingPeriod {
    ShortTerm,
    LongTerm,
}

impl fmt::Display for HoldingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortTerm => write!(f, "short_term"),
            Self::LongTerm => write!(f, "long_term"),
        }
    }
}

/// A single purchase lot with its acquisition details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLot {
    pub lot_id: String,
    pub asset: String,
    pub purchase_date: DateTime<Utc>,
    pub purchase_price: f64,
    pub quantity: f64,
    pub current_price: f64,
}

impl TaxLot {
    #[must_use]
    pub fn cost_basis(&self) -> f64 {
        self.purchase_price * self.quantity
    }

    #[must_use]
    pub fn current_value(&self) -> f64 {
        self.current_price * self.quantity
    }

    /// Negative for a loss.
    #[must_use]
    pub fn unrealized_gain_loss(&self) -> f64 {
        self.current_value() - self.cost_basis()
    }

    #[must_use]
    pub fn days_held(&self, as_of: DateTime<Utc>) -> i64 {
        (as_of - self.purchase_date).num_days()
    }

    #[must_use]
    pub fn holding_period(&self, as_of: DateTime<Utc>) -> HoldingPeriod {
        if self.days_held(as_of) >= LONG_TERM_HOLDING_DAYS {
            HoldingPeriod::LongTerm
        } else {
            HoldingPeriod::ShortTerm
        }
    }
}

/// A past trade consulted during wash-sale screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTransaction {
    pub asset: String,
    pub action: TradeAction,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .expect("valid date")
    }

    fn lot() -> TaxLot {
        TaxLot {
            lot_id: "LOT-1".to_string(),
            asset: "VTI".to_string(),
            purchase_date: date(2024, 1, 10),
            purchase_price: 250.0,
            quantity: 40.0,
            current_price: 230.0,
        }
    }

    #[test]
    fn lot_valuation() {
        let lot = lot();
        assert_eq!(lot.cost_basis(), 10_000.0);
        assert_eq!(lot.current_value(), 9_200.0);
        assert_eq!(lot.unrealized_gain_loss(), -800.0);
    }

    #[test]
    fn holding_period_boundary_is_inclusive() {
        let lot = lot();
        let one_year_later = date(2025, 1, 9);
        assert_eq!(lot.holding_period(one_year_later), HoldingPeriod::LongTerm);
        assert_eq!(
            lot.holding_period(date(2024, 6, 1)),
            HoldingPeriod::ShortTerm
        );
    }

    #[test]
    fn trade_action_display_matches_wire_form() {
        assert_eq!(TradeAction::Buy.to_string(), "BUY");
        assert_eq!(TradeAction::Sell.to_string(), "SELL");
    }

    #[test]
    fn snapshot_total_includes_cash() {
        let mut holdings = IndexMap::new();
        holdings.insert("AAPL".to_string(), 25_000.0);
        holdings.insert("BND".to_string(), 20_000.0);
        let portfolio = PortfolioSnapshot {
            holdings,
            cash: 8_000.0,
        };
        assert_eq!(portfolio.total_value(), 53_000.0);
    }
}
