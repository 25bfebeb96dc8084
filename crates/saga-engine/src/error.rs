use thiserror::Error;

use crate::status::SagaStatus;

/// Informational outcome of a short-circuited duplicate submission.
///
/// Not an exception in the business sense: the run is skipped and the prior
/// terminal status is returned, with this error's display text carried in
/// the result's `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate transaction '{transaction_id}'; previous status: {previous}")]
pub struct DuplicateTransaction {
    pub transaction_id: String,
    pub previous: SagaStatus,
}

/// Failure injected at a step boundary when a run's cancel token is set.
///
/// Cancellation is a failure from the orchestrator's point of view: the run
/// goes through the same rollback path as any other step failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("saga cancelled before step '{step}'")]
pub struct Cancelled {
    pub step: String,
}
