use finlog_domain::{LogId, PeriodError, UnknownDirection};
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Log not found: {0}")]
    LogNotFound(LogId),
    #[error("Goal not found: {0}")]
    GoalNotFound(String),
    #[error("Category `{0}` already exists")]
    DuplicateCategory(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Advice generation failed: {0}")]
    Advice(String),
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Duplicate,
    Storage,
    External,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::CategoryNotFound(_)
            | CoreError::LogNotFound(_)
            | CoreError::GoalNotFound(_) => ErrorKind::NotFound,
            CoreError::DuplicateCategory(_) => ErrorKind::Duplicate,
            CoreError::Storage(_) | CoreError::Serde(_) | CoreError::Io(_) => ErrorKind::Storage,
            CoreError::Advice(_) => ErrorKind::External,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<PeriodError> for CoreError {
    fn from(err: PeriodError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

impl From<UnknownDirection> for CoreError {
    fn from(err: UnknownDirection) -> Self {
        CoreError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}
