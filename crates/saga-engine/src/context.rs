use serde::Serialize;

use crate::log::StepLog;

/// Per-run execution context, exclusively owned by one saga run.
///
/// The orchestrator itself depends only on the core fields; everything the
/// concrete workflow needs lives in the typed `data` payload. Created fresh
/// by the caller before each run, mutated step by step, and returned inside
/// the [`SagaResult`](crate::SagaResult) at run end.
#[derive(Debug, Clone, Serialize)]
pub struct SagaContext<D> {
    /// Transaction identity; derived from the payload fingerprint when empty.
    pub transaction_id: String,
    /// Names of steps that completed the forward pass, in execution order.
    pub executed_steps: Vec<String>,
    /// Ordered audit trail of every attempted transition.
    pub logs: Vec<StepLog>,
    /// First failing step's error text, if any.
    pub error: Option<String>,
    /// Workflow-specific payload.
    pub data: D,
}

impl<D> SagaContext<D> {
    #[must_use]
    pub fn new(data: D) -> Self {
        Self {
            transaction_id: String::new(),
            executed_steps: Vec::new(),
            logs: Vec::new(),
            error: None,
            data,
        }
    }

    /// Supply an explicit transaction id instead of deriving one.
    #[must_use]
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = transaction_id.into();
        self
    }
}
