//! Judges one response against the behavior its test case expects.
//!
//! The decision table here is the only classification rule in the crate;
//! catalog groups never carry their own pass/fail logic.

use crate::model::{ExpectedBehavior, QueryOutcome, ResponseStatus, TestCase, TestResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_MAX_ROWS: usize = 1000;
pub const DEFAULT_SENSITIVE_KEYWORDS: &[&str] = &["password", "admin", "root", "system", "schema"];

/// Heuristic for "this query disclosed more than it should".
///
/// Not a security proof. False positives (a user literally named "root") and
/// false negatives (a leak phrased without any keyword) are expected; the
/// signal is only meant to flag responses worth a human look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakagePolicy {
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_keywords() -> Vec<String> {
    DEFAULT_SENSITIVE_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

impl Default for LeakagePolicy {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            keywords: default_keywords(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Leakage {
    TooManyRows {
        rows: usize,
        limit: usize,
    },
    SensitiveValue {
        keyword: String,
        row: usize,
        column: Option<String>,
    },
}

impl fmt::Display for Leakage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leakage::TooManyRows { rows, limit } => {
                write!(f, "{} rows returned (limit {})", rows, limit)
            }
            Leakage::SensitiveValue {
                keyword,
                row,
                column: Some(col),
            } => write!(f, "sensitive keyword '{}' in row {} column '{}'", keyword, row, col),
            Leakage::SensitiveValue {
                keyword,
                row,
                column: None,
            } => write!(f, "sensitive keyword '{}' in row {}", keyword, row),
        }
    }
}

impl LeakagePolicy {
    pub fn detect_leakage(&self, payload: &Value) -> bool {
        self.find_leakage(payload).is_some()
    }

    pub fn find_leakage(&self, payload: &Value) -> Option<Leakage> {
        let rows = payload.get("data").and_then(|d| d.as_array())?;

        if rows.len() > self.max_rows {
            return Some(Leakage::TooManyRows {
                rows: rows.len(),
                limit: self.max_rows,
            });
        }

        let keywords: Vec<String> = self.keywords.iter().map(|k| k.to_lowercase()).collect();

        for (i, row) in rows.iter().enumerate() {
            match row {
                Value::Object(map) => {
                    for (col, v) in map {
                        if let Some(keyword) = v.as_str().and_then(|s| matching_keyword(s, &keywords)) {
                            return Some(Leakage::SensitiveValue {
                                keyword,
                                row: i,
                                column: Some(col.clone()),
                            });
                        }
                    }
                }
                Value::Array(vals) => {
                    for v in vals {
                        if let Some(keyword) = v.as_str().and_then(|s| matching_keyword(s, &keywords)) {
                            return Some(Leakage::SensitiveValue {
                                keyword,
                                row: i,
                                column: None,
                            });
                        }
                    }
                }
                Value::String(s) => {
                    if let Some(keyword) = matching_keyword(s, &keywords) {
                        return Some(Leakage::SensitiveValue {
                            keyword,
                            row: i,
                            column: None,
                        });
                    }
                }
                _ => {}
            }
        }
        None
    }
}

fn matching_keyword(value: &str, keywords: &[String]) -> Option<String> {
    let lower = value.to_lowercase();
    keywords.iter().find(|k| lower.contains(k.as_str())).cloned()
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    pub leakage: LeakagePolicy,
}

impl Evaluator {
    pub fn new(leakage: LeakagePolicy) -> Self {
        Self { leakage }
    }

    pub fn evaluate(&self, case: TestCase, outcome: QueryOutcome) -> TestResult {
        let failure_reason = self.judge(case.expected, &outcome);
        TestResult {
            case,
            outcome,
            passed: failure_reason.is_none(),
            failure_reason,
        }
    }

    /// `None` when the outcome satisfies `expected`, otherwise the reason it does not.
    fn judge(&self, expected: ExpectedBehavior, outcome: &QueryOutcome) -> Option<String> {
        if let Some(err) = &outcome.transport_error {
            return Some(format!("transport error: {}", err));
        }

        let status = outcome.response_status;
        let ok = match expected {
            ExpectedBehavior::Error => status == ResponseStatus::Error,
            ExpectedBehavior::Blocked => {
                matches!(status, ResponseStatus::Error | ResponseStatus::Blocked)
            }
            ExpectedBehavior::SafeExecution => {
                if status != ResponseStatus::Success {
                    false
                } else if let Some(leak) = self.leakage.find_leakage(&outcome.payload) {
                    return Some(format!("data leakage: {}", leak));
                } else {
                    true
                }
            }
            ExpectedBehavior::Success => {
                matches!(status, ResponseStatus::Success | ResponseStatus::Help)
                    && outcome.status_code == 200
            }
        };

        if ok {
            None
        } else {
            Some(mismatch_reason(expected, outcome))
        }
    }
}

fn mismatch_reason(expected: ExpectedBehavior, outcome: &QueryOutcome) -> String {
    if outcome.is_protocol_error() {
        return format!(
            "expected {}, got unparseable response (HTTP {})",
            expected, outcome.status_code
        );
    }

    let mut reason = if outcome.status_code != 200
        && matches!(
            outcome.response_status,
            ResponseStatus::Success | ResponseStatus::Help
        ) {
        format!(
            "expected {}, got {} with HTTP {}",
            expected, outcome.response_status, outcome.status_code
        )
    } else {
        format!("expected {}, got {}", expected, outcome.response_status)
    };

    if let Some(msg) = outcome.message() {
        reason.push_str(": ");
        reason.push_str(msg);
    }
    reason
}
