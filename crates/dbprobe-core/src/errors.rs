use std::fmt;

/// Invalid run parameters. The only error class that stops a run before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Finds a `ConfigError` anywhere in an error chain.
pub fn as_config_error(e: &anyhow::Error) -> Option<&ConfigError> {
    e.chain().find_map(|c| c.downcast_ref::<ConfigError>())
}
