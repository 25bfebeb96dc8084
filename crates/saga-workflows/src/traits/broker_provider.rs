use crate::error::WorkflowError;
use crate::types::{OrderFill, TradeAction};

/// Order execution seam.
///
/// Sagas call this for every forward order and for every reversing order
/// placed during compensation.
pub trait BrokerProvider: Send + Sync {
    /// Places a dollar-denominated order and returns the resulting fill.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::OrderRejected`] when the broker refuses the
    /// order.
    fn place_order(
        &self,
        asset: &str,
        side: TradeAction,
        amount: f64,
    ) -> Result<OrderFill, WorkflowError>;
}
