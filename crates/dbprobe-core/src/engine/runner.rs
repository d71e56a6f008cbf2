use crate::catalog::Batch;
use crate::client::QueryClient;
use crate::errors::ConfigError;
use crate::evaluator::Evaluator;
use crate::model::{QueryOutcome, TestCase, TestResult};
use crate::report::{RunArtifacts, RunInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

#[derive(Debug, Clone)]
pub struct RunPolicy {
    /// Per-statement timeout handed to the client. There is no run-level deadline.
    pub timeout: Duration,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Dispatches cases through a [`QueryClient`] and judges each outcome.
///
/// With `concurrency == 1` cases run strictly in order on the calling task.
/// With `N > 1` the input is dealt round-robin: worker `w` owns indices
/// `w, w + N, w + 2N, ...` and runs them in ascending order. Workers hand back
/// `(index, result)` pairs and the runner places each into its own slot, so
/// the returned list is always in submission order.
#[derive(Clone)]
pub struct Runner {
    pub client: Arc<dyn QueryClient>,
    pub evaluator: Arc<Evaluator>,
    pub policy: RunPolicy,
    pub stop: Option<Arc<AtomicBool>>,
}

impl Runner {
    pub fn new(client: Arc<dyn QueryClient>, evaluator: Evaluator, policy: RunPolicy) -> Self {
        Self {
            client,
            evaluator: Arc::new(evaluator),
            policy,
            stop: None,
        }
    }

    /// Once the flag is set no further case is dispatched; cases already in flight finish.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub async fn run(
        &self,
        cases: &[TestCase],
        concurrency: usize,
    ) -> Result<Vec<TestResult>, ConfigError> {
        check(cases.len(), concurrency)?;

        tracing::info!(
            event = "dbprobe.run.start",
            cases = cases.len(),
            concurrency,
            client = self.client.name()
        );

        let results = self.dispatch(cases, concurrency).await;
        self.log_finish(&results, cases.len());
        Ok(results)
    }

    /// [`Runner::run`] plus the run metadata the report needs.
    pub async fn run_suite(
        &self,
        cases: &[TestCase],
        concurrency: usize,
    ) -> Result<RunArtifacts, ConfigError> {
        let started_at = chrono::Utc::now();
        let clock = Instant::now();
        let results = self.run(cases, concurrency).await?;

        Ok(RunArtifacts {
            info: RunInfo {
                target: None,
                started_at,
                wall_clock_seconds: clock.elapsed().as_secs_f64(),
                concurrency,
                requested_cases: cases.len(),
                interrupted: results.len() < cases.len(),
            },
            results,
        })
    }

    /// Runs batches one after another, each at `max(concurrency, batch floor)`.
    ///
    /// Results keep selection order across batches.
    pub async fn run_batches(
        &self,
        batches: &[Batch],
        concurrency: usize,
    ) -> Result<RunArtifacts, ConfigError> {
        let requested: usize = batches.iter().map(|b| b.cases.len()).sum();
        check(requested, concurrency)?;

        let started_at = chrono::Utc::now();
        let clock = Instant::now();
        tracing::info!(
            event = "dbprobe.run.start",
            cases = requested,
            batches = batches.len(),
            concurrency,
            client = self.client.name()
        );

        let mut results = Vec::with_capacity(requested);
        for (i, batch) in batches.iter().enumerate() {
            if self.stopped() {
                break;
            }
            let width = batch.concurrency(concurrency);
            tracing::debug!(event = "dbprobe.batch.start", batch = i, cases = batch.cases.len(), concurrency = width);
            results.extend(self.dispatch(&batch.cases, width).await);
        }
        self.log_finish(&results, requested);

        Ok(RunArtifacts {
            info: RunInfo {
                target: None,
                started_at,
                wall_clock_seconds: clock.elapsed().as_secs_f64(),
                concurrency,
                requested_cases: requested,
                interrupted: results.len() < requested,
            },
            results,
        })
    }

    async fn dispatch(&self, cases: &[TestCase], concurrency: usize) -> Vec<TestResult> {
        if cases.is_empty() {
            Vec::new()
        } else if concurrency == 1 {
            self.run_sequential(cases).await
        } else {
            self.run_pool(cases, concurrency).await
        }
    }

    fn log_finish(&self, results: &[TestResult], requested: usize) {
        tracing::info!(
            event = "dbprobe.run.finish",
            dispatched = results.len(),
            passed = results.iter().filter(|r| r.passed).count(),
            interrupted = results.len() < requested
        );
    }

    fn stopped(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    async fn run_sequential(&self, cases: &[TestCase]) -> Vec<TestResult> {
        let mut out = Vec::with_capacity(cases.len());
        for tc in cases {
            if self.stopped() {
                tracing::warn!(event = "dbprobe.run.interrupted", dispatched = out.len());
                break;
            }
            out.push(self.run_case(tc.clone()).await);
        }
        out
    }

    async fn run_pool(&self, cases: &[TestCase], concurrency: usize) -> Vec<TestResult> {
        let workers = concurrency.min(cases.len());
        let shared: Arc<[TestCase]> = Arc::from(cases);
        let mut handles = Vec::with_capacity(workers);

        for w in 0..workers {
            let this = self.clone();
            let cases = shared.clone();
            let h = tokio::spawn(async move {
                let mut done = Vec::new();
                for idx in (w..cases.len()).step_by(workers) {
                    if this.stopped() {
                        break;
                    }
                    done.push((idx, this.run_case(cases[idx].clone()).await));
                }
                done
            });
            handles.push(h);
        }

        let mut slots: Vec<Option<TestResult>> = (0..cases.len()).map(|_| None).collect();
        for (w, h) in handles.into_iter().enumerate() {
            match h.await {
                Ok(done) => {
                    for (idx, r) in done {
                        slots[idx] = Some(r);
                    }
                }
                Err(e) => {
                    // the worker's finished results died with it; account for every case it owned
                    tracing::error!(event = "dbprobe.worker.failed", worker = w, error = %e);
                    for idx in (w..cases.len()).step_by(workers) {
                        slots[idx] = Some(worker_failure(&cases[idx], &e.to_string()));
                    }
                }
            }
        }

        if self.stopped() {
            tracing::warn!(
                event = "dbprobe.run.interrupted",
                dispatched = slots.iter().filter(|s| s.is_some()).count()
            );
        }

        slots.into_iter().flatten().collect()
    }

    async fn run_case(&self, tc: TestCase) -> TestResult {
        tracing::debug!(event = "dbprobe.case.start", case = %tc.name, expected = %tc.expected);
        let outcome = self.client.execute(&tc.sql, self.policy.timeout).await;
        let r = self.evaluator.evaluate(tc, outcome);

        if r.passed {
            tracing::debug!(
                event = "dbprobe.case.pass",
                case = %r.case.name,
                latency_ms = r.latency() * 1000.0
            );
        } else {
            tracing::warn!(
                event = "dbprobe.case.fail",
                case = %r.case.name,
                reason = r.failure_reason.as_deref().unwrap_or(""),
                latency_ms = r.latency() * 1000.0
            );
        }
        r
    }
}

fn check(cases: usize, concurrency: usize) -> Result<(), ConfigError> {
    if concurrency < 1 {
        return Err(ConfigError(format!(
            "concurrency must be at least 1 (got {})",
            concurrency
        )));
    }
    if cases == 0 {
        return Err(ConfigError("no test cases selected".into()));
    }
    Ok(())
}

fn worker_failure(tc: &TestCase, error: &str) -> TestResult {
    let reason = format!("worker task failed: {}", error);
    TestResult {
        case: tc.clone(),
        outcome: QueryOutcome::transport_failure(reason.clone(), 0.0),
        passed: false,
        failure_reason: Some(reason),
    }
}
