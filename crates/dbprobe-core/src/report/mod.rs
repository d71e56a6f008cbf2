use crate::model::TestResult;
use crate::stats::RunStatistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod console;
pub mod json;
pub mod junit;

pub const DEFAULT_SLOW_THRESHOLD_SECONDS: f64 = 1.0;
pub const DEFAULT_SLOW_TOP_N: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub started_at: DateTime<Utc>,
    pub wall_clock_seconds: f64,
    pub concurrency: usize,
    pub requested_cases: usize,
    pub interrupted: bool,
}

/// Everything one run produced, in submission order.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub info: RunInfo,
    pub results: Vec<TestResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    #[serde(default = "default_slow_threshold")]
    pub slow_threshold_seconds: f64,
    /// Cap for the console view only; the persisted report keeps every slow test.
    #[serde(default = "default_slow_top_n")]
    pub slow_top_n: usize,
}

fn default_slow_threshold() -> f64 {
    DEFAULT_SLOW_THRESHOLD_SECONDS
}

fn default_slow_top_n() -> usize {
    DEFAULT_SLOW_TOP_N
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            slow_threshold_seconds: DEFAULT_SLOW_THRESHOLD_SECONDS,
            slow_top_n: DEFAULT_SLOW_TOP_N,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunInfo>,
    pub statistics: RunStatistics,
    pub failures: Vec<TestResult>,
    pub slow_tests: Vec<TestResult>,
    pub results: Vec<TestResult>,
}

impl Report {
    /// Pure formatting: picks failures and slow tests out of `results`, no judgment.
    pub fn render(stats: RunStatistics, results: &[TestResult], opts: &ReportOptions) -> Self {
        let failures = results.iter().filter(|r| !r.passed).cloned().collect();

        let mut slow_tests: Vec<TestResult> = results
            .iter()
            .filter(|r| r.latency() > opts.slow_threshold_seconds)
            .cloned()
            .collect();
        // stable: ties keep submission order
        slow_tests.sort_by(|a, b| {
            b.latency()
                .partial_cmp(&a.latency())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            generated_at: Utc::now(),
            run: None,
            statistics: stats,
            failures,
            slow_tests,
            results: results.to_vec(),
        }
    }

    pub fn with_run(mut self, info: RunInfo) -> Self {
        self.run = Some(info);
        self
    }

    pub fn slowest(&self, n: usize) -> &[TestResult] {
        &self.slow_tests[..self.slow_tests.len().min(n)]
    }
}
