use std::fmt;

/// A single unit of forward and compensating business logic.
///
/// Steps mutate a shared per-run payload `D` in place; write order through
/// the sequential forward pass is the ordering contract. A step flagged as
/// pivot marks the point of no return: once it has executed, the rollback
/// walk never compensates it or anything before it.
///
/// # Type Parameters
///
/// - `D`: the per-saga payload threaded through every step of one run
pub trait TransactionStep<D>: Send + Sync {
    /// Error type for step failures. The orchestrator treats any failure
    /// identically regardless of cause and records its display text.
    type Error: fmt::Display;

    /// Stable identifier, unique within one saga definition.
    fn name(&self) -> &'static str;

    /// Whether this step is a point-of-no-return.
    fn is_pivot(&self) -> bool {
        false
    }

    /// Perform the forward action.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails; the orchestrator then stops the
    /// forward pass and rolls back.
    fn execute(&self, data: &mut D) -> Result<(), Self::Error>;

    /// Undo the effect of a previously successful `execute`.
    ///
    /// Must be safe to call even if the original effect was partial;
    /// best-effort compensation is acceptable. The default implementation is
    /// a no-op, suitable for read-only steps.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails. A failed compensation is
    /// logged but never halts the rollback walk.
    fn compensate(&self, data: &mut D) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }
}
