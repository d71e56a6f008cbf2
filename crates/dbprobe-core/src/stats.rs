use crate::model::TestResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub count: usize,
    pub success_count: usize,
    pub success_rate: f64,
    pub avg_latency: f64,
    pub min_latency: f64,
    pub max_latency: f64,
    pub total_latency: f64,
    pub throughput_ops_per_sec: f64,
}

/// View over one run's ordered results. Recomputed from the list, never kept in sync by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_cases: usize,
    pub passed: usize,
    pub failed: usize,
    pub overall: CategoryStats,
    pub per_category: BTreeMap<String, CategoryStats>,
}

#[derive(Default)]
struct Bucket {
    latencies: Vec<f64>,
    successes: usize,
}

impl Bucket {
    fn push(&mut self, r: &TestResult) {
        self.latencies.push(r.latency());
        if r.passed {
            self.successes += 1;
        }
    }

    fn finish(&self) -> CategoryStats {
        let count = self.latencies.len();
        if count == 0 {
            return CategoryStats::default();
        }

        let total: f64 = self.latencies.iter().sum();
        let min = self.latencies.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.latencies.iter().copied().fold(0.0, f64::max);

        CategoryStats {
            count,
            success_count: self.successes,
            success_rate: self.successes as f64 / count as f64,
            avg_latency: total / count as f64,
            min_latency: min,
            max_latency: max,
            total_latency: total,
            throughput_ops_per_sec: if total > 0.0 {
                self.successes as f64 / total
            } else {
                0.0
            },
        }
    }
}

/// Folds judged results into overall and per-category statistics.
///
/// Every result lands in exactly one category bucket and in the overall bucket.
pub fn aggregate(results: &[TestResult]) -> RunStatistics {
    let mut overall = Bucket::default();
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

    for r in results {
        overall.push(r);
        buckets
            .entry(r.case.category_label().to_string())
            .or_default()
            .push(r);
    }

    let passed = overall.successes;
    RunStatistics {
        total_cases: results.len(),
        passed,
        failed: results.len() - passed,
        overall: overall.finish(),
        per_category: buckets
            .into_iter()
            .map(|(k, b)| (k, b.finish()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpectedBehavior, QueryOutcome, TestCase};

    fn result(category: Option<&str>, latency: f64, passed: bool) -> TestResult {
        let mut case = TestCase::new("t", "SELECT 1;", ExpectedBehavior::Success);
        case.category = category.map(String::from);
        TestResult {
            case,
            outcome: QueryOutcome::from_body(200, r#"{"status":"success"}"#, latency),
            passed,
            failure_reason: None,
        }
    }

    #[test]
    fn test_empty_results_are_all_zero() {
        let s = aggregate(&[]);
        assert_eq!(s.total_cases, 0);
        assert_eq!(s.passed + s.failed, 0);
        assert_eq!(s.overall.throughput_ops_per_sec, 0.0);
        assert_eq!(s.overall.avg_latency, 0.0);
        assert_eq!(s.overall.success_rate, 0.0);
        assert!(s.per_category.is_empty());
    }

    #[test]
    fn test_zero_latency_bucket_has_zero_throughput() {
        let s = aggregate(&[result(Some("SELECT"), 0.0, true), result(Some("SELECT"), 0.0, true)]);
        let sel = &s.per_category["SELECT"];
        assert_eq!(sel.count, 2);
        assert_eq!(sel.throughput_ops_per_sec, 0.0);
        assert!(sel.throughput_ops_per_sec.is_finite());
    }

    #[test]
    fn test_buckets_and_overall() {
        let results = vec![
            result(Some("INSERT"), 0.5, true),
            result(Some("INSERT"), 1.5, false),
            result(Some("SELECT"), 0.25, true),
            result(None, 0.75, true),
        ];
        let s = aggregate(&results);

        assert_eq!(s.total_cases, 4);
        assert_eq!(s.passed, 3);
        assert_eq!(s.failed, 1);

        let ins = &s.per_category["INSERT"];
        assert_eq!(ins.count, 2);
        assert_eq!(ins.success_count, 1);
        assert_eq!(ins.min_latency, 0.5);
        assert_eq!(ins.max_latency, 1.5);
        assert!((ins.avg_latency - 1.0).abs() < 1e-9);
        assert!((ins.throughput_ops_per_sec - 0.5).abs() < 1e-9);
        assert!((ins.success_rate - 0.5).abs() < 1e-9);

        assert_eq!(s.per_category["uncategorized"].count, 1);

        let per_cat_total: usize = s.per_category.values().map(|c| c.count).sum();
        assert_eq!(per_cat_total, results.len());
        assert!((s.overall.total_latency - 3.0).abs() < 1e-9);
        assert!((s.overall.throughput_ops_per_sec - 1.0).abs() < 1e-9);
    }
}
