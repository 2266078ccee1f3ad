//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violated numeric preconditions and schema faults.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no convergence after {iterations} bracket extensions (last x = {last_x})")]
    NoConvergence { iterations: usize, last_x: f64 },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("schema mismatch at {path}: expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}
