use std::sync::Mutex;
use std::sync::mpsc;

use crate::status::StepStatus;

/// Lifecycle callbacks invoked synchronously inline with execution.
///
/// Callers must not block these for long; they run on the orchestrator's own
/// call stack. Use [`ChannelListener`] to move log streaming off that stack.
pub trait SagaListener: Send + Sync {
    /// Called before a step's forward action runs. `index` is 1-based.
    fn on_step_start(&self, name: &str, index: usize, total: usize) {
        let _ = (name, index, total);
    }

    /// Called after a step's forward action or compensation settles.
    fn on_step_complete(&self, name: &str, status: StepStatus) {
        let _ = (name, status);
    }
}

/// Step lifecycle event as carried by [`ChannelListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    Started {
        name: String,
        index: usize,
        total: usize,
    },
    Completed {
        name: String,
        status: StepStatus,
    },
}

/// Listener that forwards events over an `mpsc` channel.
///
/// Send failures are ignored: a disconnected receiver must not fail the run.
pub struct ChannelListener {
    sender: Mutex<mpsc::Sender<StepEvent>>,
}

impl ChannelListener {
    #[must_use]
    pub fn new(sender: mpsc::Sender<StepEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }

    fn send(&self, event: StepEvent) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(event);
        }
    }
}

impl SagaListener for ChannelListener {
    fn on_step_start(&self, name: &str, index: usize, total: usize) {
        self.send(StepEvent::Started {
            name: name.to_string(),
            index,
            total,
        });
    }

    fn on_step_complete(&self, name: &str, status: StepStatus) {
        self.send(StepEvent::Completed {
            name: name.to_string(),
            status,
        });
    }
}
