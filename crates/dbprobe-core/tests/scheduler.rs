use async_trait::async_trait;
use dbprobe_core::catalog::{Catalog, CONCURRENT_WRITERS, INSERTS_PER_WRITER};
use dbprobe_core::client::QueryClient;
use dbprobe_core::engine::{RunPolicy, Runner};
use dbprobe_core::evaluator::Evaluator;
use dbprobe_core::model::{ExpectedBehavior, QueryOutcome, TestCase};
use dbprobe_core::stats::aggregate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers `success` for anything except statements containing `FAIL`.
/// Sleeps a little, varied per statement, so workers finish out of order.
struct ScriptedClient {
    calls: AtomicUsize,
}

impl ScriptedClient {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QueryClient for ScriptedClient {
    async fn execute(&self, sql: &str, _timeout: Duration) -> QueryOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let jitter = sql.len() as u64 % 4;
        tokio::time::sleep(Duration::from_millis(jitter)).await;
        if sql.contains("FAIL") {
            QueryOutcome::from_body(200, r#"{"status":"error","message":"nope"}"#, 0.001)
        } else {
            QueryOutcome::from_body(200, r#"{"status":"success","data":[]}"#, 0.001)
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct PanicsOn(&'static str);

#[async_trait]
impl QueryClient for PanicsOn {
    async fn execute(&self, sql: &str, _timeout: Duration) -> QueryOutcome {
        if sql.contains(self.0) {
            panic!("client exploded");
        }
        QueryOutcome::from_body(200, r#"{"status":"success"}"#, 0.001)
    }

    fn name(&self) -> &'static str {
        "panics"
    }
}

/// Raises the stop flag while serving the statement containing `TRIP`.
struct Trips(Arc<AtomicBool>);

#[async_trait]
impl QueryClient for Trips {
    async fn execute(&self, sql: &str, _timeout: Duration) -> QueryOutcome {
        if sql.contains("TRIP") {
            self.0.store(true, Ordering::SeqCst);
        }
        QueryOutcome::from_body(200, r#"{"status":"success"}"#, 0.001)
    }

    fn name(&self) -> &'static str {
        "trips"
    }
}

fn cases(n: usize) -> Vec<TestCase> {
    (0..n)
        .map(|i| {
            let sql = if i % 10 == 9 {
                format!("SELECT {} FAIL;", i)
            } else {
                format!("SELECT {};", "x".repeat(i % 7))
            };
            TestCase::new(format!("case_{:03}", i), sql, ExpectedBehavior::Success)
        })
        .collect()
}

fn runner(client: Arc<dyn QueryClient>) -> Runner {
    Runner::new(client, Evaluator::default(), RunPolicy::default())
}

#[tokio::test]
async fn test_pool_preserves_submission_order() {
    let client = Arc::new(ScriptedClient::new());
    let input = cases(100);

    let results = runner(client.clone()).run(&input, 8).await.unwrap();

    assert_eq!(results.len(), 100);
    assert_eq!(client.calls.load(Ordering::SeqCst), 100);
    for (i, r) in results.iter().enumerate() {
        assert_eq!(r.case.name, format!("case_{:03}", i));
    }
}

#[tokio::test]
async fn test_sequential_and_pooled_agree() {
    let input = cases(37);
    let seq = runner(Arc::new(ScriptedClient::new()))
        .run(&input, 1)
        .await
        .unwrap();
    let pooled = runner(Arc::new(ScriptedClient::new()))
        .run(&input, 5)
        .await
        .unwrap();

    let verdicts = |rs: &[dbprobe_core::model::TestResult]| -> Vec<(String, bool)> {
        rs.iter().map(|r| (r.case.name.clone(), r.passed)).collect()
    };
    assert_eq!(verdicts(&seq), verdicts(&pooled));
}

#[tokio::test]
async fn test_counts_add_up() {
    let results = runner(Arc::new(ScriptedClient::new()))
        .run(&cases(50), 4)
        .await
        .unwrap();
    let stats = aggregate(&results);

    assert_eq!(stats.total_cases, 50);
    assert_eq!(stats.passed + stats.failed, stats.total_cases);
    assert_eq!(stats.failed, 5);
    let per_category: usize = stats.per_category.values().map(|c| c.count).sum();
    assert_eq!(per_category, 50);

    let failed = results.iter().find(|r| !r.passed).unwrap();
    assert_eq!(failed.case.name, "case_009");
    assert!(failed.failure_reason.as_deref().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_more_workers_than_cases() {
    let results = runner(Arc::new(ScriptedClient::new()))
        .run(&cases(3), 16)
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.passed));
}

#[tokio::test]
async fn test_invalid_parameters_fail_before_dispatch() {
    let client = Arc::new(ScriptedClient::new());
    let r = runner(client.clone());

    let err = r.run(&cases(5), 0).await.unwrap_err();
    assert!(err.0.contains("concurrency"));

    let err = r.run(&[], 4).await.unwrap_err();
    assert!(err.0.contains("no test cases"));

    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_worker_panic_fails_its_cases() {
    let mut input = cases(8);
    input[2].sql = "SELECT BOOM;".into();

    let results = runner(Arc::new(PanicsOn("BOOM")))
        .run(&input, 4)
        .await
        .unwrap();

    assert_eq!(results.len(), 8);
    // worker 2 owned indices 2 and 6
    for idx in [2, 6] {
        assert!(!results[idx].passed);
        assert!(results[idx]
            .failure_reason
            .as_deref()
            .unwrap()
            .contains("worker task failed"));
        assert!(results[idx].outcome.is_transport_error());
    }
    for idx in [0, 1, 3, 4, 5, 7] {
        assert!(results[idx].passed, "case {} should pass", idx);
    }
}

#[tokio::test]
async fn test_stop_flag_halts_dispatch() {
    let flag = Arc::new(AtomicBool::new(false));
    let mut input = cases(10);
    input[3].sql = "SELECT TRIP;".into();

    let artifacts = runner(Arc::new(Trips(flag.clone())))
        .with_stop_flag(flag)
        .run_suite(&input, 1)
        .await
        .unwrap();

    // the tripping case itself completes, nothing after it starts
    assert_eq!(artifacts.results.len(), 4);
    assert!(artifacts.info.interrupted);
    assert_eq!(artifacts.info.requested_cases, 10);
}

#[tokio::test]
async fn test_run_suite_records_metadata() {
    let artifacts = runner(Arc::new(ScriptedClient::new()))
        .run_suite(&cases(12), 3)
        .await
        .unwrap();

    assert_eq!(artifacts.results.len(), 12);
    assert!(!artifacts.info.interrupted);
    assert_eq!(artifacts.info.concurrency, 3);
    assert!(artifacts.info.wall_clock_seconds >= 0.0);
}

/// Tracks how many statements are executing at once and the order they started in.
#[derive(Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<String>>,
}

#[async_trait]
impl QueryClient for InFlight {
    async fn execute(&self, sql: &str, _timeout: Duration) -> QueryOutcome {
        self.started.lock().unwrap().push(sql.to_string());
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        QueryOutcome::from_body(200, r#"{"status":"success"}"#, 0.005)
    }

    fn name(&self) -> &'static str {
        "in-flight"
    }
}

#[tokio::test]
async fn test_concurrency_group_runs_writers_in_parallel_at_default_width() {
    let batches = Catalog::builtin()
        .batches_for(&["concurrency".to_string()])
        .unwrap();
    let client = Arc::new(InFlight::default());

    let artifacts = runner(client.clone()).run_batches(&batches, 1).await.unwrap();

    let expected = 1 + CONCURRENT_WRITERS * INSERTS_PER_WRITER;
    assert_eq!(artifacts.results.len(), expected);
    assert!(artifacts.results.iter().all(|r| r.passed));
    assert_eq!(artifacts.info.concurrency, 1);

    let peak = client.peak.load(Ordering::SeqCst);
    assert!(peak > 1, "inserts never overlapped");
    assert!(peak <= CONCURRENT_WRITERS, "peak {} above writer count", peak);

    // the table is created alone before any writer starts
    let started = client.started.lock().unwrap();
    assert!(started[0].starts_with("CREATE TABLE concurrent_test"));
    assert!(started[1..].iter().all(|s| s.starts_with("INSERT")));
    assert!(artifacts.results[0].case.sql.starts_with("CREATE TABLE"));
}

#[tokio::test]
async fn test_plain_groups_stay_sequential_in_batches() {
    let batches = Catalog::builtin()
        .batches_for(&["basic".to_string(), "create".to_string()])
        .unwrap();
    let client = Arc::new(InFlight::default());

    let artifacts = runner(client.clone()).run_batches(&batches, 1).await.unwrap();

    assert_eq!(client.peak.load(Ordering::SeqCst), 1);
    let flat = Catalog::builtin()
        .cases_for(&["basic".to_string(), "create".to_string()])
        .unwrap();
    let names: Vec<&str> = artifacts.results.iter().map(|r| r.case.name.as_str()).collect();
    let want: Vec<&str> = flat.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, want);
}

#[tokio::test]
async fn test_run_batches_rejects_empty_selection() {
    let err = runner(Arc::new(InFlight::default()))
        .run_batches(&[], 1)
        .await
        .unwrap_err();
    assert!(err.0.contains("no test cases"));
}
