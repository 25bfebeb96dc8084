use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::StepStatus;

/// Synthetic log entry name for a short-circuited duplicate submission.
pub const IDEMPOTENCY_CHECK: &str = "IDEMPOTENCY_CHECK";

/// Marker entry bracketing the start of a compensation walk.
pub const ROLLBACK_START: &str = "ROLLBACK_START";

/// Marker entry bracketing the end of a compensation walk.
pub const ROLLBACK_COMPLETE: &str = "ROLLBACK_COMPLETE";

/// Immutable record of one step transition.
///
/// The orchestrator appends one entry per attempted transition and may
/// replace the most recent entry while its step is in flight (running to
/// success/failed, compensating to compensated/failed). Historical entries
/// are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    pub step_name: String,
    pub status: StepStatus,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_pivot: bool,
}

impl StepLog {
    #[must_use]
    pub fn new(step_name: impl Into<String>, status: StepStatus, message: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status,
            timestamp: Utc::now(),
            message: message.into(),
            error: None,
            is_pivot: false,
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn pivot(mut self) -> Self {
        self.is_pivot = true;
        self
    }
}
