use serde::{Deserialize, Serialize};

/// Behavior a test case expects from the target service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedBehavior {
    /// The statement must be rejected with an error response.
    Error,
    /// The statement must be rejected, either as an error or an explicit block.
    Blocked,
    /// The statement may run, but must not disclose sensitive or bulk data.
    SafeExecution,
    /// The statement must run successfully.
    Success,
}

impl ExpectedBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpectedBehavior::Error => "error",
            ExpectedBehavior::Blocked => "blocked",
            ExpectedBehavior::SafeExecution => "safe_execution",
            ExpectedBehavior::Success => "success",
        }
    }
}

impl std::fmt::Display for ExpectedBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub sql: String,
    #[serde(alias = "expected_behavior")]
    pub expected: ExpectedBehavior,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, sql: impl Into<String>, expected: ExpectedBehavior) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            expected,
            description: String::new(),
            group: None,
            category: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Bucket used by the statistics aggregator.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// Status reported by the target in the `status` field of its JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
    Help,
    Blocked,
    Partial,
    Unknown,
}

impl ResponseStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "success" => ResponseStatus::Success,
            "error" => ResponseStatus::Error,
            "help" => ResponseStatus::Help,
            "blocked" => ResponseStatus::Blocked,
            "partial" => ResponseStatus::Partial,
            _ => ResponseStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Success => "success",
            ResponseStatus::Error => "error",
            ResponseStatus::Help => "help",
            ResponseStatus::Blocked => "blocked",
            ResponseStatus::Partial => "partial",
            ResponseStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized result of dispatching one SQL statement.
///
/// Every failure mode is carried as data: `status_code == 0` together with
/// `transport_error` means the request never got a response, `raw_text`
/// means the body was not JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub status_code: u16,
    pub response_status: ResponseStatus,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub latency_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_error: Option<String>,
}

impl QueryOutcome {
    /// Builds an outcome from a received HTTP response body.
    pub fn from_body(status_code: u16, body: &str, latency_seconds: f64) -> Self {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(payload) => {
                let response_status = payload
                    .get("status")
                    .and_then(|s| s.as_str())
                    .map(ResponseStatus::parse)
                    .unwrap_or(ResponseStatus::Unknown);
                Self {
                    status_code,
                    response_status,
                    payload,
                    raw_text: None,
                    latency_seconds: latency_seconds.max(0.0),
                    transport_error: None,
                }
            }
            Err(_) => Self {
                status_code,
                // a non-JSON error page still counts as the target refusing the statement
                response_status: if status_code == 200 {
                    ResponseStatus::Unknown
                } else {
                    ResponseStatus::Error
                },
                payload: serde_json::Value::Null,
                raw_text: Some(body.to_string()),
                latency_seconds: latency_seconds.max(0.0),
                transport_error: None,
            },
        }
    }

    pub fn transport_failure(error: impl Into<String>, latency_seconds: f64) -> Self {
        Self {
            status_code: 0,
            response_status: ResponseStatus::Unknown,
            payload: serde_json::Value::Null,
            raw_text: None,
            latency_seconds: latency_seconds.max(0.0),
            transport_error: Some(error.into()),
        }
    }

    pub fn is_transport_error(&self) -> bool {
        self.transport_error.is_some()
    }

    pub fn is_protocol_error(&self) -> bool {
        self.transport_error.is_none() && self.raw_text.is_some()
    }

    /// Human-facing message: the target's `message` field, else the transport error.
    pub fn message(&self) -> Option<&str> {
        self.payload
            .get("message")
            .and_then(|m| m.as_str())
            .or(self.transport_error.as_deref())
    }

    /// Result rows from the `data` field of a data-returning response.
    pub fn rows(&self) -> Option<&Vec<serde_json::Value>> {
        self.payload.get("data").and_then(|d| d.as_array())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub case: TestCase,
    pub outcome: QueryOutcome,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl TestResult {
    pub fn latency(&self) -> f64 {
        self.outcome.latency_seconds
    }
}
