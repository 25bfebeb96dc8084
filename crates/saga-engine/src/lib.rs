//! Transactional saga orchestration.
//!
//! This crate executes an ordered list of business steps as an all-or-nothing
//! workflow: if any step fails, previously completed steps are compensated in
//! reverse order, stopping at an optional pivot (point-of-no-return) step.
//! Runs are protected against duplicate submission by a deterministic,
//! content-addressed transaction id and an injectable idempotency store.

mod cancel;
mod context;
mod error;
mod idempotency;
mod identity;
mod listener;
mod log;
mod orchestrator;
mod status;
mod step;

pub use cancel::CancelToken;
pub use context::SagaContext;
pub use error::{Cancelled, DuplicateTransaction};
pub use idempotency::{BeginOutcome, IdempotencyStore, InMemoryIdempotencyStore};
pub use identity::{Fingerprint, derive_transaction_id};
pub use listener::{ChannelListener, SagaListener, StepEvent};
pub use log::{IDEMPOTENCY_CHECK, ROLLBACK_COMPLETE, ROLLBACK_START, StepLog};
pub use orchestrator::{SagaOrchestrator, SagaOrchestratorBuilder, SagaResult};
pub use status::{SagaStatus, StepStatus};
pub use step::TransactionStep;
