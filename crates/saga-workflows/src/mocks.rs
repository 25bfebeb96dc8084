//! Test doubles for the provider seams.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::WorkflowError;
use crate::traits::BrokerProvider;
use crate::types::{OrderFill, TradeAction};

/// Broker double that records every fill and can reject one side.
#[derive(Debug, Default)]
pub struct MockBroker {
    placed: Mutex<Vec<OrderFill>>,
    reject_side: Option<TradeAction>,
    sequence: AtomicU64,
}

impl MockBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every order on the given side.
    #[must_use]
    pub fn rejecting(side: TradeAction) -> Self {
        Self {
            reject_side: Some(side),
            ..Self::default()
        }
    }

    /// Fills recorded so far, in placement order.
    #[must_use]
    pub fn placed(&self) -> Vec<OrderFill> {
        match self.placed.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl BrokerProvider for MockBroker {
    fn place_order(
        &self,
        asset: &str,
        side: TradeAction,
        amount: f64,
    ) -> Result<OrderFill, WorkflowError> {
        if self.reject_side == Some(side) {
            return Err(WorkflowError::OrderRejected {
                asset: asset.to_string(),
                reason: "rejected by mock broker".to_string(),
            });
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let fill = OrderFill {
            order_id: format!("MOCK_{side}_{asset}_{sequence:03}"),
            asset: asset.to_string(),
            side,
            amount,
            fill_price: amount,
            compensation_for: None,
        };
        match self.placed.lock() {
            Ok(mut guard) => guard.push(fill.clone()),
            Err(poisoned) => poisoned.into_inner().push(fill.clone()),
        }
        Ok(fill)
    }
}
