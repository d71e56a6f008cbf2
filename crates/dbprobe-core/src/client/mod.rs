use crate::model::QueryOutcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod http;

pub use http::HttpQueryClient;

/// Sends one SQL statement to the target and normalizes whatever comes back.
///
/// Implementations never fail: transport and protocol problems are folded
/// into the returned [`QueryOutcome`].
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn execute(&self, sql: &str, timeout: Duration) -> QueryOutcome;
    fn name(&self) -> &'static str;
}

/// How the statement is carried to the query endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMethod {
    /// `?sql=` query parameter.
    #[default]
    Get,
    /// URL-encoded form body with a `sql` field.
    Post,
}

impl std::str::FromStr for RequestMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(RequestMethod::Get),
            "post" => Ok(RequestMethod::Post),
            other => Err(format!("unknown request method '{}' (expected get|post)", other)),
        }
    }
}
