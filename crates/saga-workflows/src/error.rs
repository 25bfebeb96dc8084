use thiserror::Error;

/// Errors raised by workflow steps.
///
/// Any of these aborts the forward pass and triggers the compensation walk.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("markets are closed")]
    MarketClosed,

    #[error("insufficient funds for buy orders: required {required:.2}, available {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("no valid tax-loss harvesting opportunities after wash sale screening")]
    NoValidOpportunities,

    #[error("order rejected for '{asset}': {reason}")]
    OrderRejected { asset: String, reason: String },

    #[error("unable to purchase replacement securities")]
    ReplacementUnavailable,
}
