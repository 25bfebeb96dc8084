//! Step report rendering for the terminal.

use saga_engine::{SagaListener, SagaStatus, StepLog, StepStatus};

/// Prints step progress as the orchestrator advances.
pub(crate) struct ProgressListener;

impl SagaListener for ProgressListener {
    fn on_step_start(&self, name: &str, index: usize, total: usize) {
        println!("[{index}/{total}] {name} ...");
    }

    fn on_step_complete(&self, name: &str, status: StepStatus) {
        println!("  {} {name}: {status}", glyph(status));
    }
}

fn glyph(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Success | StepStatus::Compensated => "\u{2713}",
        StepStatus::Failed => "\u{2717}",
        StepStatus::Compensating => "\u{21a9}",
        StepStatus::Skipped => "\u{2192}",
        StepStatus::Pending | StepStatus::Running => "\u{2026}",
    }
}

pub(crate) fn print_report(
    status: SagaStatus,
    transaction_id: &str,
    logs: &[StepLog],
    error: Option<&str>,
) {
    println!();
    println!("Step log:");
    for log in logs {
        match &log.error {
            Some(step_error) => println!(
                "  {} {} ({}): {step_error}",
                glyph(log.status),
                log.step_name,
                log.status
            ),
            None => println!("  {} {} ({})", glyph(log.status), log.step_name, log.status),
        }
    }
    println!();
    println!("Result: {status} (transaction {transaction_id})");
    if let Some(error) = error {
        println!("Error: {error}");
    }
}
