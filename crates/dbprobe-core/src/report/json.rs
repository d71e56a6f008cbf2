use super::Report;
use crate::model::TestResult;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_PREFIX: &str = "dbprobe";

/// Persists the full report as `<prefix>_report_<unix seconds>.json` under `out_dir`.
///
/// An existing file is never overwritten; a numeric suffix is added instead.
pub fn write_report(report: &Report, out_dir: &Path, prefix: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;

    let stamp = report.generated_at.timestamp();
    let mut path = out_dir.join(format!("{}_report_{}.json", prefix, stamp));
    let mut n = 1;
    while path.exists() {
        path = out_dir.join(format!("{}_report_{}_{}.json", prefix, stamp, n));
        n += 1;
    }

    let body = serde_json::to_string_pretty(&to_json(report))?;
    std::fs::write(&path, body)?;
    tracing::info!(event = "dbprobe.report.written", path = %path.display());
    Ok(path)
}

pub fn to_json(report: &Report) -> Value {
    let s = &report.statistics;
    let mut summary = json!({
        "total_tests": s.total_cases,
        "passed": s.passed,
        "failed": s.failed,
        "success_rate": s.overall.success_rate,
        "avg_response_time": s.overall.avg_latency,
        "min_response_time": s.overall.min_latency,
        "max_response_time": s.overall.max_latency,
        "throughput": s.overall.throughput_ops_per_sec,
        "categories": s.per_category,
    });
    if let Some(run) = &report.run {
        summary["run"] = json!(run);
    }

    json!({
        "timestamp": report.generated_at.to_rfc3339(),
        "summary": summary,
        "failures": report.failures.iter().map(|r| r.case.name.as_str()).collect::<Vec<_>>(),
        "slow_tests": report
            .slow_tests
            .iter()
            .map(|r| json!({ "test_name": r.case.name, "response_time": r.latency() }))
            .collect::<Vec<_>>(),
        "test_results": report.results.iter().map(result_entry).collect::<Vec<_>>(),
    })
}

fn result_entry(r: &TestResult) -> Value {
    let response = match (&r.outcome.payload, &r.outcome.raw_text) {
        (Value::Null, Some(raw)) => Value::String(raw.clone()),
        (payload, _) => payload.clone(),
    };
    json!({
        "test_name": r.case.name,
        "group": r.case.group,
        "category": r.case.category_label(),
        "sql": r.case.sql,
        "expected": r.case.expected,
        "success": r.passed,
        "response_time": r.outcome.latency_seconds,
        "status_code": r.outcome.status_code,
        "response_status": r.outcome.response_status,
        "response": response,
        "error_message": r.failure_reason,
        "transport_error": r.outcome.transport_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpectedBehavior, QueryOutcome, TestCase};
    use crate::report::ReportOptions;
    use crate::stats::aggregate;

    fn sample() -> Report {
        let results = vec![
            TestResult {
                case: TestCase::new("ok", "SHOW TABLES;", ExpectedBehavior::Success)
                    .in_group("basic")
                    .with_category("COMMAND"),
                outcome: QueryOutcome::from_body(200, r#"{"status":"success","data":[]}"#, 0.05),
                passed: true,
                failure_reason: None,
            },
            TestResult {
                case: TestCase::new("garbled", "HELP;", ExpectedBehavior::Success),
                outcome: QueryOutcome::from_body(200, "<html>", 0.05),
                passed: false,
                failure_reason: Some("expected success, got unparseable response (HTTP 200)".into()),
            },
        ];
        Report::render(aggregate(&results), &results, &ReportOptions::default())
    }

    #[test]
    fn test_write_report_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&sample(), dir.path(), "fuzz").unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("fuzz_report_"));
        assert!(name.ends_with(".json"));

        let v: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(v["timestamp"].is_string());
        assert_eq!(v["summary"]["total_tests"], 2);
        assert_eq!(v["summary"]["passed"], 1);
        assert_eq!(v["summary"]["failed"], 1);
        assert_eq!(v["summary"]["categories"]["COMMAND"]["count"], 1);

        let rows = v["test_results"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["test_name"], "ok");
        assert_eq!(rows[0]["sql"], "SHOW TABLES;");
        assert_eq!(rows[0]["status_code"], 200);
        assert_eq!(rows[0]["expected"], "success");
        assert_eq!(rows[1]["success"], false);
        assert_eq!(rows[1]["response"], "<html>");
        assert_eq!(rows[1]["response_status"], "unknown");
        assert!(rows[1]["error_message"].as_str().unwrap().contains("unparseable"));
    }

    #[test]
    fn test_write_report_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample();
        let a = write_report(&report, dir.path(), DEFAULT_REPORT_PREFIX).unwrap();
        let b = write_report(&report, dir.path(), DEFAULT_REPORT_PREFIX).unwrap();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }
}
