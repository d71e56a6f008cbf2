use crate::catalog::{Catalog, Group};
use crate::client::RequestMethod;
use crate::errors::ConfigError;
use crate::evaluator::LeakagePolicy;
use crate::model::{TestCase, UNCATEGORIZED};
use crate::report::json::DEFAULT_REPORT_PREFIX;
use crate::report::{ReportOptions, DEFAULT_SLOW_THRESHOLD_SECONDS, DEFAULT_SLOW_TOP_N};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TARGET_URL: &str = "http://localhost:8080";
pub const CUSTOM_GROUP: &str = "custom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_target_url")]
    pub target_url: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    #[serde(default)]
    pub method: RequestMethod,
    /// Group keys or presets; empty means every group.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub leakage: LeakagePolicy,
    #[serde(default)]
    pub report: ReportSettings,
    /// Extra cases, run as the `custom` group.
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junit: Option<PathBuf>,
    #[serde(default = "default_slow_threshold")]
    pub slow_threshold_seconds: f64,
    #[serde(default = "default_slow_top_n")]
    pub slow_top_n: usize,
}

impl ReportSettings {
    pub fn options(&self) -> ReportOptions {
        ReportOptions {
            slow_threshold_seconds: self.slow_threshold_seconds,
            slow_top_n: self.slow_top_n,
        }
    }
}

fn default_target_url() -> String {
    DEFAULT_TARGET_URL.to_string()
}

fn default_concurrency() -> usize {
    1
}

fn default_timeout_seconds() -> f64 {
    30.0
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_prefix() -> String {
    DEFAULT_REPORT_PREFIX.to_string()
}

fn default_slow_threshold() -> f64 {
    DEFAULT_SLOW_THRESHOLD_SECONDS
}

fn default_slow_top_n() -> usize {
    DEFAULT_SLOW_TOP_N
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            prefix: default_prefix(),
            junit: None,
            slow_threshold_seconds: DEFAULT_SLOW_THRESHOLD_SECONDS,
            slow_top_n: DEFAULT_SLOW_TOP_N,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            concurrency: default_concurrency(),
            timeout_seconds: default_timeout_seconds(),
            method: RequestMethod::default(),
            groups: Vec::new(),
            leakage: LeakagePolicy::default(),
            report: ReportSettings::default(),
            tests: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn apply_env(&mut self) {
        self.apply_env_from(|k| std::env::var(k).ok());
    }

    /// Env overrides sit between the file and command-line flags.
    pub fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("DBPROBE_URL") {
            self.target_url = v;
        }
        if let Some(v) = get("DBPROBE_CONCURRENCY") {
            match v.parse() {
                Ok(n) => self.concurrency = n,
                Err(_) => tracing::warn!(event = "dbprobe.config.env_ignored", key = "DBPROBE_CONCURRENCY", value = %v),
            }
        }
        if let Some(v) = get("DBPROBE_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.timeout_seconds = n,
                Err(_) => tracing::warn!(event = "dbprobe.config.env_ignored", key = "DBPROBE_TIMEOUT_SECS", value = %v),
            }
        }
        if let Some(v) = get("DBPROBE_METHOD") {
            match v.parse() {
                Ok(m) => self.method = m,
                Err(e) => tracing::warn!(event = "dbprobe.config.env_ignored", key = "DBPROBE_METHOD", error = %e),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_url.trim().is_empty() {
            return Err(ConfigError("target_url must not be empty".into()));
        }
        if self.concurrency < 1 {
            return Err(ConfigError(format!(
                "concurrency must be at least 1 (got {})",
                self.concurrency
            )));
        }
        if !(self.timeout_seconds.is_finite() && self.timeout_seconds > 0.0) {
            return Err(ConfigError(format!(
                "timeout_seconds must be positive (got {})",
                self.timeout_seconds
            )));
        }
        if let Err(e) = Duration::try_from_secs_f64(self.timeout_seconds) {
            return Err(ConfigError(format!(
                "timeout_seconds out of range (got {}): {}",
                self.timeout_seconds, e
            )));
        }
        if let Some(tc) = self.tests.iter().find(|t| t.sql.trim().is_empty()) {
            return Err(ConfigError(format!("test '{}' has empty sql", tc.name)));
        }
        Ok(())
    }

    /// Falls back to the default for values `validate` would reject.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_timeout_seconds()))
    }

    /// Built-in groups, plus `custom` when the config declares its own tests.
    pub fn catalog(&self) -> Catalog {
        let builtin = Catalog::builtin();
        if self.tests.is_empty() {
            return builtin;
        }
        builtin.with_group(Group::new(
            CUSTOM_GROUP,
            "User-defined tests",
            UNCATEGORIZED,
            self.tests.clone(),
        ))
    }
}

pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;

    let mut ignored_keys = Vec::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);
    let cfg: RunConfig = serde_ignored::deserialize(deserializer, |p| {
        ignored_keys.push(p.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML {}: {}", path.display(), e)))?;

    if !ignored_keys.is_empty() {
        tracing::warn!(
            event = "dbprobe.config.unknown_keys",
            file = %path.display(),
            keys = ?ignored_keys
        );
    }

    cfg.validate()?;
    Ok(cfg)
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError(format!(
            "{} already exists, refusing to overwrite",
            path.display()
        )));
    }
    std::fs::write(
        path,
        r#"target_url: http://localhost:8080
concurrency: 4
timeout_seconds: 30
method: get
groups: [quick]
leakage:
  max_rows: 1000
  keywords: [password, admin, root, system, schema]
report:
  out_dir: reports
  prefix: dbprobe
  slow_threshold_seconds: 1.0
  slow_top_n: 10
tests:
  - name: custom_select_one
    sql: "SELECT 1;"
    expected: success
  - name: custom_reject_garbage
    sql: "SELEC * FORM nowhere;"
    expected: error
"#,
    )
    .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}
