use super::{QueryClient, RequestMethod};
use crate::model::QueryOutcome;
use async_trait::async_trait;
use std::time::{Duration, Instant};

pub struct HttpQueryClient {
    pub base_url: String,
    pub method: RequestMethod,
    pub client: reqwest::Client,
}

impl HttpQueryClient {
    pub fn new(base_url: impl Into<String>, method: RequestMethod) -> Self {
        Self {
            base_url: base_url.into(),
            method,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn execute(&self, sql: &str, timeout: Duration) -> QueryOutcome {
        let start = Instant::now();

        let req = match self.method {
            RequestMethod::Get => self.client.get(&self.base_url).query(&[("sql", sql)]),
            RequestMethod::Post => self.client.post(&self.base_url).form(&[("sql", sql)]),
        };

        let resp = match req.timeout(timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                let msg = describe(&e, timeout);
                tracing::warn!(event = "dbprobe.transport_error", url = %self.base_url, error = %msg);
                return QueryOutcome::transport_failure(msg, start.elapsed().as_secs_f64());
            }
        };

        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(b) => b,
            Err(e) => {
                // headers arrived but the body did not
                let msg = describe(&e, timeout);
                tracing::warn!(event = "dbprobe.transport_error", url = %self.base_url, status, error = %msg);
                return QueryOutcome::transport_failure(msg, start.elapsed().as_secs_f64());
            }
        };
        let latency = start.elapsed().as_secs_f64();

        tracing::debug!(
            event = "dbprobe.response",
            status,
            bytes = body.len(),
            latency_ms = latency * 1000.0
        );

        QueryOutcome::from_body(status, &body, latency)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn describe(e: &reqwest::Error, timeout: Duration) -> String {
    if e.is_timeout() {
        format!("timeout after {:.1}s: {}", timeout.as_secs_f64(), e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    }
}
