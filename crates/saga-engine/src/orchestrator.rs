use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::context::SagaContext;
use crate::error::{Cancelled, DuplicateTransaction};
use crate::idempotency::{BeginOutcome, IdempotencyStore, InMemoryIdempotencyStore};
use crate::identity::{Fingerprint, derive_transaction_id};
use crate::listener::SagaListener;
use crate::log::{IDEMPOTENCY_CHECK, ROLLBACK_COMPLETE, ROLLBACK_START, StepLog};
use crate::status::{SagaStatus, StepStatus};
use crate::step::TransactionStep;

/// Terminal snapshot of one saga run.
#[derive(Debug, Serialize)]
pub struct SagaResult<D> {
    pub status: SagaStatus,
    pub transaction_id: String,
    pub logs: Vec<StepLog>,
    pub context: SagaContext<D>,
    pub error: Option<String>,
}

impl<D> SagaResult<D> {
    /// Caller-facing subset of the result as a JSON value.
    ///
    /// Carries status, transaction id, ordered logs and the error; the
    /// workflow payload is deliberately left out, so this works for any `D`
    /// and stays small enough to stream or log.
    #[must_use]
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status,
            "transaction_id": self.transaction_id,
            "logs": self.logs,
            "error": self.error,
        })
    }
}

/// Sequences steps, detects failure, drives rollback, enforces idempotency
/// and emits lifecycle callbacks.
///
/// Every run ends in exactly one of three outcomes: `Success`, `RolledBack`,
/// or a duplicate short-circuit carrying the prior terminal status. The full
/// ordered log is returned in all three cases.
pub struct SagaOrchestrator<D, E> {
    steps: Vec<Box<dyn TransactionStep<D, Error = E>>>,
    listener: Option<Arc<dyn SagaListener>>,
    store: Arc<dyn IdempotencyStore>,
    cancel: Option<CancelToken>,
}

impl<D, E: fmt::Display> SagaOrchestrator<D, E> {
    #[must_use]
    pub fn builder() -> SagaOrchestratorBuilder<D, E> {
        SagaOrchestratorBuilder::new()
    }

    /// Step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Name of the pivot step, if the definition has one.
    #[must_use]
    pub fn pivot_step(&self) -> Option<&'static str> {
        self.steps
            .iter()
            .find(|step| step.is_pivot())
            .map(|step| step.name())
    }

    /// Execute the saga against a fresh context.
    ///
    /// Derives a deterministic transaction id when the context carries none,
    /// short-circuits duplicates, runs the forward pass in order, and on
    /// failure compensates executed steps in reverse up to the start or a
    /// pivot. Business failures never panic; they classify the run as
    /// `RolledBack` and surface the first failing step's error verbatim.
    pub fn run(&self, mut ctx: SagaContext<D>) -> SagaResult<D>
    where
        D: Fingerprint,
    {
        if ctx.transaction_id.is_empty() {
            ctx.transaction_id = derive_transaction_id(&ctx.data);
        }
        let transaction_id = ctx.transaction_id.clone();

        if let BeginOutcome::Duplicate(previous) = self.store.begin(&transaction_id) {
            let duplicate = DuplicateTransaction {
                transaction_id: transaction_id.clone(),
                previous,
            };
            debug!(%transaction_id, %previous, "duplicate submission short-circuited");
            ctx.logs.push(StepLog::new(
                IDEMPOTENCY_CHECK,
                StepStatus::Skipped,
                duplicate.to_string(),
            ));
            return SagaResult {
                status: previous,
                transaction_id,
                logs: ctx.logs.clone(),
                error: Some(duplicate.to_string()),
                context: ctx,
            };
        }

        ctx.executed_steps.clear();
        let total = self.steps.len();
        let mut failed_at: Option<usize> = None;

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(token) = &self.cancel {
                if token.is_cancelled() {
                    let cancelled = Cancelled {
                        step: step.name().to_string(),
                    };
                    warn!(%transaction_id, step = step.name(), "run cancelled");
                    ctx.logs.push(
                        StepLog::new(step.name(), StepStatus::Failed, "run cancelled")
                            .with_error(cancelled.to_string()),
                    );
                    ctx.error = Some(cancelled.to_string());
                    failed_at = Some(index);
                    break;
                }
            }

            self.notify_start(step.name(), index + 1, total);
            ctx.logs.push(StepLog::new(
                step.name(),
                StepStatus::Running,
                format!("executing step {}/{total}", index + 1),
            ));

            match step.execute(&mut ctx.data) {
                Ok(()) => {
                    debug!(%transaction_id, step = step.name(), "step completed");
                    replace_last(
                        &mut ctx.logs,
                        StepLog::new(step.name(), StepStatus::Success, "step completed"),
                    );
                    ctx.executed_steps.push(step.name().to_string());
                    self.notify_complete(step.name(), StepStatus::Success);
                }
                Err(error) => {
                    let text = error.to_string();
                    warn!(%transaction_id, step = step.name(), error = %text, "step failed");
                    replace_last(
                        &mut ctx.logs,
                        StepLog::new(step.name(), StepStatus::Failed, "step failed")
                            .with_error(&text),
                    );
                    self.notify_complete(step.name(), StepStatus::Failed);
                    ctx.error = Some(text);
                    failed_at = Some(index);
                    break;
                }
            }
        }

        let Some(failed_index) = failed_at else {
            self.store.finish(&transaction_id, SagaStatus::Success);
            return SagaResult {
                status: SagaStatus::Success,
                transaction_id,
                logs: ctx.logs.clone(),
                error: None,
                context: ctx,
            };
        };

        self.rollback(failed_index, &mut ctx);
        self.store.finish(&transaction_id, SagaStatus::RolledBack);

        // The saga-level error is always the original failure, never a
        // compensation error.
        let error = ctx.error.clone();
        SagaResult {
            status: SagaStatus::RolledBack,
            transaction_id,
            logs: ctx.logs.clone(),
            error,
            context: ctx,
        }
    }

    /// Compensate executed steps in reverse order, halting at a pivot.
    fn rollback(&self, failed_index: usize, ctx: &mut SagaContext<D>) {
        ctx.logs.push(StepLog::new(
            ROLLBACK_START,
            StepStatus::Compensating,
            format!("starting rollback from step {failed_index}"),
        ));

        for index in (0..failed_index).rev() {
            let step = &self.steps[index];

            if step.is_pivot() {
                debug!(step = step.name(), "pivot reached; rollback halted");
                ctx.logs.push(
                    StepLog::new(
                        step.name(),
                        StepStatus::Skipped,
                        "pivot transaction; cannot compensate past this point",
                    )
                    .pivot(),
                );
                break;
            }

            ctx.logs.push(StepLog::new(
                step.name(),
                StepStatus::Compensating,
                "compensating step",
            ));

            match step.compensate(&mut ctx.data) {
                Ok(()) => {
                    debug!(step = step.name(), "compensation successful");
                    replace_last(
                        &mut ctx.logs,
                        StepLog::new(step.name(), StepStatus::Compensated, "compensation successful"),
                    );
                    self.notify_complete(step.name(), StepStatus::Compensated);
                }
                Err(error) => {
                    // Best-effort rollback: log and keep walking.
                    let text = error.to_string();
                    warn!(step = step.name(), error = %text, "compensation failed");
                    replace_last(
                        &mut ctx.logs,
                        StepLog::new(step.name(), StepStatus::Failed, "compensation failed")
                            .with_error(&text),
                    );
                }
            }
        }

        ctx.logs.push(StepLog::new(
            ROLLBACK_COMPLETE,
            StepStatus::Compensated,
            "rollback completed",
        ));
    }

    fn notify_start(&self, name: &str, index: usize, total: usize) {
        if let Some(listener) = &self.listener {
            listener.on_step_start(name, index, total);
        }
    }

    fn notify_complete(&self, name: &str, status: StepStatus) {
        if let Some(listener) = &self.listener {
            listener.on_step_complete(name, status);
        }
    }
}

fn replace_last(logs: &mut [StepLog], entry: StepLog) {
    if let Some(last) = logs.last_mut() {
        *last = entry;
    }
}

/// Builder assembling an orchestrator from ordered steps and collaborators.
pub struct SagaOrchestratorBuilder<D, E> {
    steps: Vec<Box<dyn TransactionStep<D, Error = E>>>,
    listener: Option<Arc<dyn SagaListener>>,
    store: Option<Arc<dyn IdempotencyStore>>,
    cancel: Option<CancelToken>,
}

impl<D, E: fmt::Display> SagaOrchestratorBuilder<D, E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            listener: None,
            store: None,
            cancel: None,
        }
    }

    /// Append a step to the forward execution order.
    #[must_use]
    pub fn step<S>(mut self, step: S) -> Self
    where
        S: TransactionStep<D, Error = E> + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn SagaListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Inject a shared idempotency store; defaults to a fresh in-memory one.
    #[must_use]
    pub fn idempotency_store(mut self, store: Arc<dyn IdempotencyStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn build(self) -> SagaOrchestrator<D, E> {
        SagaOrchestrator {
            steps: self.steps,
            listener: self.listener,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryIdempotencyStore::new())),
            cancel: self.cancel,
        }
    }
}

impl<D, E: fmt::Display> Default for SagaOrchestratorBuilder<D, E> {
    fn default() -> Self {
        Self::new()
    }
}
