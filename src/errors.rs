use finlog_config::ConfigError;
use finlog_core::{CoreError, ErrorKind};
use thiserror::Error;

pub type FinlogResult<T> = Result<T, FinlogError>;

/// Top-level error for the composed application.
#[derive(Debug, Error)]
pub enum FinlogError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl FinlogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FinlogError::Core(err) => err.kind(),
            FinlogError::Config(_) => ErrorKind::Storage,
        }
    }
}
