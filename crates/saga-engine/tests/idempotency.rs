//! Integration tests for duplicate-submission protection and transaction ids.

use std::sync::{Arc, Mutex};

use saga_engine::{
    BeginOutcome, Fingerprint, IDEMPOTENCY_CHECK, IdempotencyStore, InMemoryIdempotencyStore,
    SagaContext, SagaOrchestrator, SagaStatus, StepStatus, TransactionStep, derive_transaction_id,
};

#[derive(Debug, Clone)]
struct TestData {
    tag: String,
}

impl Fingerprint for TestData {
    fn fingerprint(&self) -> String {
        self.tag.clone()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

struct CountingStep {
    name: &'static str,
    calls: Arc<Mutex<usize>>,
    fail: bool,
}

impl TransactionStep<TestData> for CountingStep {
    type Error = TestError;

    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(&self, _data: &mut TestData) -> Result<(), TestError> {
        *self.calls.lock().expect("calls lock") += 1;
        if self.fail {
            return Err(TestError("forced failure".to_string()));
        }
        Ok(())
    }
}

fn counting_orchestrator(
    calls: &Arc<Mutex<usize>>,
    fail: bool,
) -> SagaOrchestrator<TestData, TestError> {
    SagaOrchestrator::builder()
        .step(CountingStep {
            name: "Step1",
            calls: Arc::clone(calls),
            fail,
        })
        .build()
}

#[test]
fn resubmitting_the_same_context_executes_steps_once() {
    let calls = Arc::new(Mutex::new(0_usize));
    let orchestrator = counting_orchestrator(&calls, false);
    let data = TestData {
        tag: "same-request".to_string(),
    };

    let first = orchestrator.run(SagaContext::new(data.clone()));
    let second = orchestrator.run(SagaContext::new(data));

    assert_eq!(first.status, SagaStatus::Success);
    assert_eq!(second.status, first.status);
    assert_eq!(*calls.lock().expect("calls lock"), 1);
    assert!(second.error.expect("error").contains("duplicate"));
}

#[test]
fn duplicate_result_carries_a_single_skipped_log_entry() {
    let calls = Arc::new(Mutex::new(0_usize));
    let orchestrator = counting_orchestrator(&calls, false);
    let data = TestData {
        tag: "dup-log".to_string(),
    };

    let _first = orchestrator.run(SagaContext::new(data.clone()));
    let second = orchestrator.run(SagaContext::new(data));

    assert_eq!(second.logs.len(), 1);
    assert_eq!(second.logs[0].step_name, IDEMPOTENCY_CHECK);
    assert_eq!(second.logs[0].status, StepStatus::Skipped);
}

#[test]
fn rolled_back_runs_are_also_deduplicated() {
    let calls = Arc::new(Mutex::new(0_usize));
    let orchestrator = counting_orchestrator(&calls, true);
    let data = TestData {
        tag: "failed-request".to_string(),
    };

    let first = orchestrator.run(SagaContext::new(data.clone()));
    let second = orchestrator.run(SagaContext::new(data));

    assert_eq!(first.status, SagaStatus::RolledBack);
    assert_eq!(second.status, SagaStatus::RolledBack);
    assert_eq!(*calls.lock().expect("calls lock"), 1);
}

#[test]
fn identical_content_derives_identical_ids_across_runs() {
    let calls = Arc::new(Mutex::new(0_usize));
    let orchestrator = counting_orchestrator(&calls, false);

    let first = orchestrator.run(SagaContext::new(TestData {
        tag: "content".to_string(),
    }));
    let second = orchestrator.run(SagaContext::new(TestData {
        tag: "content".to_string(),
    }));

    assert_eq!(first.transaction_id, second.transaction_id);
}

#[test]
fn different_content_derives_different_ids() {
    let a = derive_transaction_id(&TestData {
        tag: "content-a".to_string(),
    });
    let b = derive_transaction_id(&TestData {
        tag: "content-b".to_string(),
    });

    assert_ne!(a, b);
}

#[test]
fn explicit_transaction_id_bypasses_derivation() {
    let calls = Arc::new(Mutex::new(0_usize));
    let orchestrator = counting_orchestrator(&calls, false);

    let result = orchestrator.run(
        SagaContext::new(TestData {
            tag: "explicit".to_string(),
        })
        .with_transaction_id("saga_manual"),
    );

    assert_eq!(result.transaction_id, "saga_manual");
}

#[test]
fn shared_store_deduplicates_across_orchestrator_instances() {
    let store: Arc<dyn IdempotencyStore> = Arc::new(InMemoryIdempotencyStore::new());
    let calls = Arc::new(Mutex::new(0_usize));
    let first_orchestrator: SagaOrchestrator<TestData, TestError> = SagaOrchestrator::builder()
        .step(CountingStep {
            name: "Step1",
            calls: Arc::clone(&calls),
            fail: false,
        })
        .idempotency_store(Arc::clone(&store))
        .build();
    let second_orchestrator: SagaOrchestrator<TestData, TestError> = SagaOrchestrator::builder()
        .step(CountingStep {
            name: "Step1",
            calls: Arc::clone(&calls),
            fail: false,
        })
        .idempotency_store(store)
        .build();
    let data = TestData {
        tag: "shared".to_string(),
    };

    let first = first_orchestrator.run(SagaContext::new(data.clone()));
    let second = second_orchestrator.run(SagaContext::new(data));

    assert_eq!(first.status, SagaStatus::Success);
    assert_eq!(second.status, SagaStatus::Success);
    assert_eq!(*calls.lock().expect("calls lock"), 1);
}

#[test]
fn in_flight_id_surfaces_executing_as_previous_status() {
    let store = InMemoryIdempotencyStore::new();
    let id = "saga_inflight";

    assert_eq!(store.begin(id), BeginOutcome::Started);

    // A concurrent duplicate arriving mid-run sees the in-flight record.
    let calls = Arc::new(Mutex::new(0_usize));
    let orchestrator: SagaOrchestrator<TestData, TestError> = SagaOrchestrator::builder()
        .step(CountingStep {
            name: "Step1",
            calls: Arc::clone(&calls),
            fail: false,
        })
        .idempotency_store(Arc::new(store))
        .build();

    let result = orchestrator.run(
        SagaContext::new(TestData {
            tag: "inflight".to_string(),
        })
        .with_transaction_id(id),
    );

    assert_eq!(result.status, SagaStatus::Executing);
    assert_eq!(*calls.lock().expect("calls lock"), 0);
}
