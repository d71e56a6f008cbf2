use crate::model::TestResult;
use std::path::Path;

pub fn write_junit(suite: &str, results: &[TestResult], out: &Path) -> anyhow::Result<()> {
    let errors = results
        .iter()
        .filter(|r| !r.passed && r.outcome.is_transport_error())
        .count();
    let failures = results.iter().filter(|r| !r.passed).count() - errors;
    let total_time: f64 = results.iter().map(|r| r.latency()).sum();

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<testsuite name="{}" tests="{}" failures="{}" errors="{}" time="{:.3}">"#,
        escape(suite),
        results.len(),
        failures,
        errors,
        total_time
    ));
    xml.push('\n');

    for r in results {
        xml.push_str(&format!(
            r#"  <testcase name="{}" classname="{}" time="{:.3}">"#,
            escape(&r.case.name),
            escape(r.case.category_label()),
            r.latency()
        ));
        if !r.passed {
            let reason = r.failure_reason.as_deref().unwrap_or("failed");
            // transport problems are errors, not verdicts about the service
            let tag = if r.outcome.is_transport_error() {
                "error"
            } else {
                "failure"
            };
            xml.push_str(&format!(r#"<{} message="{}"/>"#, tag, escape(reason)));
        }
        xml.push_str("</testcase>\n");
    }

    xml.push_str("</testsuite>\n");
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out, xml)?;
    Ok(())
}

/// Attribute-safe text. Control characters XML 1.0 cannot carry are replaced with U+FFFD.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpectedBehavior, QueryOutcome, TestCase};

    #[test]
    fn test_junit_output_structure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("junit.xml");

        let results = vec![
            TestResult {
                case: TestCase::new("select_ok", "SELECT 1;", ExpectedBehavior::Success)
                    .with_category("SELECT"),
                outcome: QueryOutcome::from_body(200, r#"{"status":"success"}"#, 0.01),
                passed: true,
                failure_reason: None,
            },
            TestResult {
                case: TestCase::new("injection <or>", "' OR 1=1", ExpectedBehavior::Error),
                outcome: QueryOutcome::from_body(200, r#"{"status":"success"}"#, 0.01),
                passed: false,
                failure_reason: Some("expected error, got success".into()),
            },
            TestResult {
                case: TestCase::new("offline", "SELECT 1;", ExpectedBehavior::Success),
                outcome: QueryOutcome::transport_failure("connection refused", 0.0),
                passed: false,
                failure_reason: Some("transport error: connection refused".into()),
            },
        ];

        write_junit("dbprobe", &results, &path).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains(r#"<testsuite name="dbprobe" tests="3" failures="1" errors="1""#));
        assert!(content.contains(r#"<testcase name="select_ok" classname="SELECT""#));
        assert!(content.contains(r#"<testcase name="injection &lt;or&gt;""#));
        assert!(content.contains(r#"<failure message="expected error, got success"/>"#));
        assert!(content.contains(r#"<error message="transport error: connection refused"/>"#));
    }

    #[test]
    fn test_control_characters_are_replaced() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("junit.xml");

        let results = vec![TestResult {
            case: TestCase::new("nul\u{0}name", "SELECT 1;", ExpectedBehavior::Success),
            outcome: QueryOutcome::from_body(200, r#"{"status":"error"}"#, 0.01),
            passed: false,
            failure_reason: Some("bad\u{1}\u{0}byte\tok".into()),
        }];
        write_junit("dbprobe", &results, &path).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(!content.chars().any(|c| (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r')));
        assert!(content.contains("bad\u{FFFD}\u{FFFD}byte\tok"));
        assert!(content.contains("<testcase name=\"nul\u{FFFD}name\""));
        assert!(content.contains(r#"failures="1" errors="0""#));
    }
}
