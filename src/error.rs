use std::path::PathBuf;

use thiserror::Error;

/// Errors the harness can run into. Per-test `Network` and
/// `UnsupportedMethod` failures are recovered into a failed test result;
/// `ConfigLoad` is fatal.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("failed to load config {}: {reason}", path.display())]
    ConfigLoad { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    pub fn network(reason: impl std::fmt::Display) -> Self {
        HarnessError::Network(reason.to_string())
    }
}
