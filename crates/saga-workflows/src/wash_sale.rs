//! Wash-sale screening.
//!
//! A loss cannot be claimed when a substantially identical security was
//! bought within 30 days before or after the sale. ETFs tracking the same
//! index count as substantially identical here, so equivalence goes through
//! fund families rather than exact tickers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{HistoricalTransaction, TradeAction};

/// Days on either side of a sale that a repurchase disallows the loss.
pub const WASH_SALE_WINDOW_DAYS: i64 = 30;

/// A purchase that disallows harvesting a loss on `loss_asset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WashSaleViolation {
    pub loss_asset: String,
    pub conflicting_asset: String,
    pub conflicting_date: DateTime<Utc>,
    /// Signed day offset of the conflicting purchase relative to `as_of`.
    pub days_from_now: i64,
    pub reason: String,
}

/// Index family a ticker belongs to, when it tracks a broad index.
///
/// Single-name stocks fall through to `None` and are only substantially
/// identical to themselves (share classes excepted).
#[must_use]
pub fn fund_family(ticker: &str) -> Option<&'static str> {
    match ticker {
        "VTI" | "VTSAX" | "ITOT" | "SPTM" | "SCHB" => Some("total_us_stock"),
        "SPY" | "VOO" | "IVV" | "SPLG" => Some("sp500"),
        "BND" | "AGG" | "SCHZ" => Some("total_bond"),
        "VXUS" | "IXUS" | "VEU" => Some("intl_stock"),
        "GLD" | "IAU" | "GLDM" => Some("gold"),
        "VNQ" | "IYR" | "SCHH" => Some("reit"),
        "GOOG" | "GOOGL" => Some("alphabet"),
        _ => None,
    }
}

#[must_use]
pub fn is_substantially_identical(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (fund_family(a), fund_family(b)) {
        (Some(family_a), Some(family_b)) => family_a == family_b,
        _ => false,
    }
}

/// Replacement candidates that avoid a wash sale while keeping similar
/// market exposure. Empty for single-name stocks.
#[must_use]
pub fn replacements_for(ticker: &str) -> &'static [&'static str] {
    match ticker {
        "VTI" => &["ITOT", "SPTM", "SCHB"],
        "ITOT" => &["VTI", "SPTM", "SCHB"],
        "SPY" => &["VOO", "IVV", "SPLG"],
        "VOO" => &["SPY", "IVV", "SPLG"],
        "IVV" => &["SPY", "VOO", "SPLG"],
        "BND" => &["AGG", "SCHZ"],
        "AGG" => &["BND", "SCHZ"],
        "VXUS" => &["IXUS", "VEU"],
        "GLD" => &["IAU", "GLDM"],
        "VNQ" => &["IYR", "SCHH"],
        _ => &[],
    }
}

/// First purchase in `history` that would disallow selling `asset` at a
/// loss as of `as_of`. Sales in the history never conflict.
#[must_use]
pub fn find_violation(
    asset: &str,
    history: &[HistoricalTransaction],
    as_of: DateTime<Utc>,
) -> Option<WashSaleViolation> {
    history.iter().find_map(|transaction| {
        if transaction.action != TradeAction::Buy {
            return None;
        }
        if !is_substantially_identical(asset, &transaction.asset) {
            return None;
        }
        let days_from_now = (transaction.date - as_of).num_days();
        if days_from_now.abs() > WASH_SALE_WINDOW_DAYS {
            return None;
        }
        Some(WashSaleViolation {
            loss_asset: asset.to_string(),
            conflicting_asset: transaction.asset.clone(),
            conflicting_date: transaction.date,
            days_from_now,
            reason: format!(
                "purchased substantially identical '{}' {} days from sale date",
                transaction.asset,
                days_from_now.abs()
            ),
        })
    })
}
