//! Integration tests for forward execution, rollback ordering and pivots.

use std::sync::{Arc, Mutex};

use saga_engine::{
    CancelToken, Fingerprint, ROLLBACK_COMPLETE, ROLLBACK_START, SagaContext, SagaListener,
    SagaOrchestrator, SagaStatus, StepEvent, StepStatus, TransactionStep,
};

#[derive(Debug, Clone)]
struct TestData {
    tag: String,
}

impl TestData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
        }
    }
}

impl Fingerprint for TestData {
    fn fingerprint(&self) -> String {
        self.tag.clone()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

type Recorder = Arc<Mutex<Vec<String>>>;

fn recorder() -> Recorder {
    Arc::new(Mutex::new(Vec::new()))
}

fn recorded(recorder: &Recorder) -> Vec<String> {
    recorder.lock().expect("recorder lock").clone()
}

struct TrackedStep {
    name: &'static str,
    pivot: bool,
    fail_with: Option<String>,
    fail_compensation: bool,
    executions: Recorder,
    compensations: Recorder,
}

impl TrackedStep {
    fn ok(name: &'static str, executions: &Recorder, compensations: &Recorder) -> Self {
        Self {
            name,
            pivot: false,
            fail_with: None,
            fail_compensation: false,
            executions: Arc::clone(executions),
            compensations: Arc::clone(compensations),
        }
    }

    fn pivot(name: &'static str, executions: &Recorder, compensations: &Recorder) -> Self {
        Self {
            pivot: true,
            ..Self::ok(name, executions, compensations)
        }
    }

    fn failing(
        name: &'static str,
        message: &str,
        executions: &Recorder,
        compensations: &Recorder,
    ) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::ok(name, executions, compensations)
        }
    }

    fn failing_compensation(
        name: &'static str,
        executions: &Recorder,
        compensations: &Recorder,
    ) -> Self {
        Self {
            fail_compensation: true,
            ..Self::ok(name, executions, compensations)
        }
    }
}

impl TransactionStep<TestData> for TrackedStep {
    type Error = TestError;

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_pivot(&self) -> bool {
        self.pivot
    }

    fn execute(&self, _data: &mut TestData) -> Result<(), TestError> {
        if let Some(message) = &self.fail_with {
            return Err(TestError(message.clone()));
        }
        self.executions
            .lock()
            .expect("recorder lock")
            .push(self.name.to_string());
        Ok(())
    }

    fn compensate(&self, _data: &mut TestData) -> Result<(), TestError> {
        if self.fail_compensation {
            return Err(TestError(format!("compensation failed for {}", self.name)));
        }
        self.compensations
            .lock()
            .expect("recorder lock")
            .push(self.name.to_string());
        Ok(())
    }
}

#[test]
fn all_steps_succeed_in_list_order() {
    let executions = recorder();
    let compensations = recorder();
    let orchestrator = SagaOrchestrator::builder()
        .step(TrackedStep::ok("Step1", &executions, &compensations))
        .step(TrackedStep::ok("Step2", &executions, &compensations))
        .step(TrackedStep::ok("Step3", &executions, &compensations))
        .build();

    let result = orchestrator.run(SagaContext::new(TestData::new("all-success")));

    assert_eq!(result.status, SagaStatus::Success);
    assert!(result.error.is_none());
    assert_eq!(recorded(&executions), vec!["Step1", "Step2", "Step3"]);
    assert_eq!(
        result.context.executed_steps,
        vec!["Step1", "Step2", "Step3"]
    );
    assert!(recorded(&compensations).is_empty());
}

#[test]
fn failure_compensates_executed_steps_in_reverse() {
    let executions = recorder();
    let compensations = recorder();
    let orchestrator = SagaOrchestrator::builder()
        .step(TrackedStep::ok("Step1", &executions, &compensations))
        .step(TrackedStep::ok("Step2", &executions, &compensations))
        .step(TrackedStep::failing(
            "Step3",
            "Insufficient funds",
            &executions,
            &compensations,
        ))
        .step(TrackedStep::ok("Step4", &executions, &compensations))
        .build();

    let result = orchestrator.run(SagaContext::new(TestData::new("reverse-comp")));

    assert_eq!(result.status, SagaStatus::RolledBack);
    assert_eq!(result.error.as_deref(), Some("Insufficient funds"));
    // Step4 was never attempted.
    assert_eq!(recorded(&executions), vec!["Step1", "Step2"]);
    assert_eq!(recorded(&compensations), vec!["Step2", "Step1"]);
}

#[test]
fn pivot_halts_the_compensation_walk() {
    let executions = recorder();
    let compensations = recorder();
    let orchestrator = SagaOrchestrator::builder()
        .step(TrackedStep::ok("Step1", &executions, &compensations))
        .step(TrackedStep::pivot("Step2", &executions, &compensations))
        .step(TrackedStep::ok("Step3", &executions, &compensations))
        .step(TrackedStep::failing(
            "Step4",
            "boom",
            &executions,
            &compensations,
        ))
        .build();

    let result = orchestrator.run(SagaContext::new(TestData::new("pivot-halt")));

    assert_eq!(result.status, SagaStatus::RolledBack);
    // Only Step3 is compensated; Step2 is the pivot, Step1 is never touched.
    assert_eq!(recorded(&compensations), vec!["Step3"]);
    let pivot_log = result
        .logs
        .iter()
        .find(|log| log.step_name == "Step2" && log.status == StepStatus::Skipped)
        .expect("pivot skip entry");
    assert!(pivot_log.is_pivot);
    assert!(pivot_log.message.contains("pivot"));
}

#[test]
fn rollback_is_bracketed_by_marker_entries() {
    let executions = recorder();
    let compensations = recorder();
    let orchestrator = SagaOrchestrator::builder()
        .step(TrackedStep::ok("Step1", &executions, &compensations))
        .step(TrackedStep::failing(
            "Step2",
            "boom",
            &executions,
            &compensations,
        ))
        .build();

    let result = orchestrator.run(SagaContext::new(TestData::new("brackets")));

    let names: Vec<&str> = result.logs.iter().map(|log| log.step_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Step1", "Step2", ROLLBACK_START, "Step1", ROLLBACK_COMPLETE]
    );
}

#[test]
fn running_entry_is_replaced_not_appended() {
    let executions = recorder();
    let compensations = recorder();
    let orchestrator = SagaOrchestrator::builder()
        .step(TrackedStep::ok("Step1", &executions, &compensations))
        .build();

    let result = orchestrator.run(SagaContext::new(TestData::new("replace")));

    assert_eq!(result.logs.len(), 1);
    assert_eq!(result.logs[0].status, StepStatus::Success);
}

#[test]
fn compensation_failure_does_not_halt_the_walk() {
    let executions = recorder();
    let compensations = recorder();
    let orchestrator = SagaOrchestrator::builder()
        .step(TrackedStep::ok("Step1", &executions, &compensations))
        .step(TrackedStep::failing_compensation(
            "Step2",
            &executions,
            &compensations,
        ))
        .step(TrackedStep::failing(
            "Step3",
            "original failure",
            &executions,
            &compensations,
        ))
        .build();

    let result = orchestrator.run(SagaContext::new(TestData::new("comp-failure")));

    // Step2's compensation failed but Step1 was still compensated, and the
    // saga-level error is the original failure, not the compensation error.
    assert_eq!(result.status, SagaStatus::RolledBack);
    assert_eq!(result.error.as_deref(), Some("original failure"));
    assert_eq!(recorded(&compensations), vec!["Step1"]);
    let failed_comp = result
        .logs
        .iter()
        .find(|log| log.step_name == "Step2" && log.status == StepStatus::Failed)
        .expect("failed compensation entry");
    assert_eq!(
        failed_comp.error.as_deref(),
        Some("compensation failed for Step2")
    );
}

#[test]
fn first_step_failure_needs_no_compensation() {
    let executions = recorder();
    let compensations = recorder();
    let orchestrator = SagaOrchestrator::builder()
        .step(TrackedStep::failing(
            "Step1",
            "immediate",
            &executions,
            &compensations,
        ))
        .build();

    let result = orchestrator.run(SagaContext::new(TestData::new("first-fail")));

    assert_eq!(result.status, SagaStatus::RolledBack);
    assert!(recorded(&compensations).is_empty());
}

struct EventListener {
    events: Mutex<Vec<StepEvent>>,
}

impl SagaListener for EventListener {
    fn on_step_start(&self, name: &str, index: usize, total: usize) {
        self.events
            .lock()
            .expect("events lock")
            .push(StepEvent::Started {
                name: name.to_string(),
                index,
                total,
            });
    }

    fn on_step_complete(&self, name: &str, status: StepStatus) {
        self.events
            .lock()
            .expect("events lock")
            .push(StepEvent::Completed {
                name: name.to_string(),
                status,
            });
    }
}

#[test]
fn listener_observes_starts_and_outcomes() {
    let executions = recorder();
    let compensations = recorder();
    let listener = Arc::new(EventListener {
        events: Mutex::new(Vec::new()),
    });
    let orchestrator = SagaOrchestrator::builder()
        .step(TrackedStep::ok("Step1", &executions, &compensations))
        .step(TrackedStep::failing(
            "Step2",
            "boom",
            &executions,
            &compensations,
        ))
        .listener(Arc::clone(&listener) as Arc<dyn SagaListener>)
        .build();

    let _result = orchestrator.run(SagaContext::new(TestData::new("listener")));

    let events = listener.events.lock().expect("events lock").clone();
    assert_eq!(
        events,
        vec![
            StepEvent::Started {
                name: "Step1".to_string(),
                index: 1,
                total: 2,
            },
            StepEvent::Completed {
                name: "Step1".to_string(),
                status: StepStatus::Success,
            },
            StepEvent::Started {
                name: "Step2".to_string(),
                index: 2,
                total: 2,
            },
            StepEvent::Completed {
                name: "Step2".to_string(),
                status: StepStatus::Failed,
            },
            StepEvent::Completed {
                name: "Step1".to_string(),
                status: StepStatus::Compensated,
            },
        ]
    );
}

#[test]
fn pre_cancelled_run_rolls_back_like_a_failure() {
    let executions = recorder();
    let compensations = recorder();
    let token = CancelToken::new();
    token.cancel();
    let orchestrator = SagaOrchestrator::builder()
        .step(TrackedStep::ok("Step1", &executions, &compensations))
        .step(TrackedStep::ok("Step2", &executions, &compensations))
        .cancel_token(token)
        .build();

    let result = orchestrator.run(SagaContext::new(TestData::new("cancelled")));

    assert_eq!(result.status, SagaStatus::RolledBack);
    assert!(result.error.expect("error").contains("cancelled"));
    assert!(recorded(&executions).is_empty());
    assert!(recorded(&compensations).is_empty());
}
