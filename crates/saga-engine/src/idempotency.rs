use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::status::SagaStatus;

/// Outcome of atomically claiming a transaction id before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// The id was unseen and is now recorded as executing.
    Started,
    /// The id was already recorded; carries its last known status, which is
    /// `Executing` for a run still in flight.
    Duplicate(SagaStatus),
}

/// Key-value store guarding against duplicate transaction execution.
///
/// `begin` must be a single atomic operation (mark executing, then report a
/// prior record) so that two concurrent submissions of the same logical
/// request cannot both pass the duplicate check.
pub trait IdempotencyStore: Send + Sync {
    /// Atomically record `transaction_id` as executing if unseen, otherwise
    /// return its last known status.
    fn begin(&self, transaction_id: &str) -> BeginOutcome;

    /// Record the terminal status of a finished run.
    fn finish(&self, transaction_id: &str, status: SagaStatus);

    /// Last known status of a transaction, if any.
    fn status(&self, transaction_id: &str) -> Option<SagaStatus>;
}

struct Entry {
    status: SagaStatus,
    recorded_at: Instant,
}

/// Default in-memory store: process-local, lost on restart.
///
/// An optional TTL evicts entries lazily on access; without one, records are
/// retained for the lifetime of the store.
#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

impl InMemoryIdempotencyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn prune(&self, entries: &mut HashMap<String, Entry>) {
        if let Some(ttl) = self.ttl {
            let now = Instant::now();
            entries.retain(|_, entry| now.duration_since(entry.recorded_at) < ttl);
        }
    }
}

impl IdempotencyStore for InMemoryIdempotencyStore {
    fn begin(&self, transaction_id: &str) -> BeginOutcome {
        let mut entries = self.lock();
        self.prune(&mut entries);
        if let Some(entry) = entries.get(transaction_id) {
            return BeginOutcome::Duplicate(entry.status);
        }
        entries.insert(
            transaction_id.to_string(),
            Entry {
                status: SagaStatus::Executing,
                recorded_at: Instant::now(),
            },
        );
        BeginOutcome::Started
    }

    fn finish(&self, transaction_id: &str, status: SagaStatus) {
        let mut entries = self.lock();
        entries.insert(
            transaction_id.to_string(),
            Entry {
                status,
                recorded_at: Instant::now(),
            },
        );
    }

    fn status(&self, transaction_id: &str) -> Option<SagaStatus> {
        let mut entries = self.lock();
        self.prune(&mut entries);
        entries.get(transaction_id).map(|entry| entry.status)
    }
}
