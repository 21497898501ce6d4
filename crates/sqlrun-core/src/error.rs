//! Error types for sqlrun

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection-level failure reported by a driver.
///
/// The code is whatever the backend uses (e.g. `ORA-01017`) when one
/// exists; drivers pass it through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionError {
    pub code: Option<String>,
    pub message: String,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Failure of a single unit's execution or commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub code: Option<String>,
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<SqlRunError> for ExecutionError {
    /// Collapse whatever came out of `Session::execute_unit` into the
    /// unit-scoped pair recorded in results.
    fn from(err: SqlRunError) -> Self {
        match err {
            SqlRunError::Execution(e) => e,
            other => Self::new(other.to_string()),
        }
    }
}

/// Core error type for sqlrun operations
#[derive(Error, Debug)]
pub enum SqlRunError {
    #[error("Connection error: {0}")]
    Connection(ConnectionError),

    #[error("Execution error: {0}")]
    Execution(ExecutionError),

    #[error("Could not read script {}: {message}", .path.display())]
    FileRead { path: PathBuf, message: String },

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Result type alias for sqlrun operations
pub type Result<T> = std::result::Result<T, SqlRunError>;
