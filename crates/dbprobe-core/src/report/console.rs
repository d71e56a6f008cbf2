use super::{Report, ReportOptions};
use std::fmt::Write;

const SQL_PREVIEW_CHARS: usize = 100;

pub fn print_summary(report: &Report, opts: &ReportOptions) {
    eprint!("{}", render_summary(report, opts));
}

pub fn render_summary(report: &Report, opts: &ReportOptions) -> String {
    let mut out = String::new();
    let s = &report.statistics;
    let pct = |n: usize| {
        if s.total_cases == 0 {
            0.0
        } else {
            n as f64 * 100.0 / s.total_cases as f64
        }
    };

    let _ = writeln!(out, "\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if let Some(run) = &report.run {
        if let Some(target) = &run.target {
            let _ = writeln!(out, "Target: {}", target);
        }
        let _ = writeln!(
            out,
            "Run: {} of {} cases dispatched, concurrency {}, {:.2}s wall clock{}",
            s.total_cases,
            run.requested_cases,
            run.concurrency,
            run.wall_clock_seconds,
            if run.interrupted { " (interrupted)" } else { "" }
        );
    }
    let _ = writeln!(out, "Total:  {}", s.total_cases);
    let _ = writeln!(out, "Passed: {} ({:.1}%)", s.passed, pct(s.passed));
    let _ = writeln!(out, "Failed: {} ({:.1}%)", s.failed, pct(s.failed));
    let _ = writeln!(out, "Average latency: {:.3}s", s.overall.avg_latency);

    if !s.per_category.is_empty() {
        let _ = writeln!(out, "\nCategories:");
        for (label, c) in &s.per_category {
            let _ = writeln!(
                out,
                "  {:<18} {:>4}/{:<4} avg {:.3}s  min {:.3}s  max {:.3}s  {:.2} ops/sec",
                label,
                c.success_count,
                c.count,
                c.avg_latency,
                c.min_latency,
                c.max_latency,
                c.throughput_ops_per_sec
            );
        }
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out, "\nFailures:");
        for r in &report.failures {
            let _ = writeln!(out, "❌ {}", r.case.name);
            let _ = writeln!(out, "    SQL: {}", preview(&r.case.sql, SQL_PREVIEW_CHARS));
            let _ = writeln!(
                out,
                "    Error: {}",
                r.failure_reason.as_deref().unwrap_or("unknown")
            );
        }
    }

    let slow = report.slowest(opts.slow_top_n);
    if !slow.is_empty() {
        let _ = writeln!(out, "\nSlow tests (>{:.1}s):", opts.slow_threshold_seconds);
        for r in slow {
            let _ = writeln!(out, "⏱️  {:<40} {:.3}s", r.case.name, r.latency());
        }
    }

    let _ = writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let _ = writeln!(
        out,
        "Summary: {} passed, {} failed, {:.2} ops/sec",
        s.passed, s.failed, s.overall.throughput_ops_per_sec
    );
    out
}

/// First `max` characters of a single-line rendering of `sql`.
pub fn preview(sql: &str, max: usize) -> String {
    let flat: String = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max {
        let cut: String = flat.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpectedBehavior, QueryOutcome, TestCase, TestResult};
    use crate::report::Report;
    use crate::stats::aggregate;

    #[test]
    fn test_preview_is_char_safe() {
        let sql = format!("SELECT '{}';", "特".repeat(200));
        let p = preview(&sql, 100);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 103);
        assert_eq!(preview("SELECT\n  1;", 100), "SELECT 1;");
    }

    #[test]
    fn test_summary_lists_failures_and_slow_tests() {
        let results = vec![
            TestResult {
                case: TestCase::new("slow select", "SELECT * FROM big;", ExpectedBehavior::Success)
                    .with_category("SELECT"),
                outcome: QueryOutcome::from_body(200, r#"{"status":"success"}"#, 2.5),
                passed: true,
                failure_reason: None,
            },
            TestResult {
                case: TestCase::new("typo", "SELCT 1;", ExpectedBehavior::Success),
                outcome: QueryOutcome::from_body(200, r#"{"status":"error"}"#, 0.1),
                passed: false,
                failure_reason: Some("expected success, got error".into()),
            },
        ];
        let opts = ReportOptions::default();
        let report = Report::render(aggregate(&results), &results, &opts);
        let text = render_summary(&report, &opts);

        assert!(text.contains("Total:  2"));
        assert!(text.contains("Passed: 1 (50.0%)"));
        assert!(text.contains("❌ typo"));
        assert!(text.contains("SQL: SELCT 1;"));
        assert!(text.contains("Error: expected success, got error"));
        assert!(text.contains("Slow tests (>1.0s):"));
        assert!(text.contains("slow select"));
        assert!(text.contains("SELECT"));
        assert!(text.contains("uncategorized"));
    }
}
