use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::WorkflowError;
use crate::traits::BrokerProvider;
use crate::types::{OrderFill, TradeAction};

/// Broker that fills every order at the requested notional.
///
/// Order ids embed a process-local sequence number so fills placed by the
/// same broker instance never collide.
#[derive(Debug, Default)]
pub struct SimulatedBroker {
    sequence: AtomicU64,
}

impl SimulatedBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BrokerProvider for SimulatedBroker {
    fn place_order(
        &self,
        asset: &str,
        side: TradeAction,
        amount: f64,
    ) -> Result<OrderFill, WorkflowError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(OrderFill {
            order_id: format!("{side}_{asset}_{sequence:06}"),
            asset: asset.to_string(),
            side,
            amount,
            fill_price: amount,
            compensation_for: None,
        })
    }
}
