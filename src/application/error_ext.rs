//! Error helpers that attach a file path to failures.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::DomainError;

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&path)
    ///     .with_path_context("read sectioned text", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

/// Prefix parse errors with the file they came from.
pub trait ParseResultExt<T> {
    fn in_file(self, path: &Path) -> ApplicationResult<T>;
}

impl<T> ParseResultExt<T> for ApplicationResult<T> {
    fn in_file(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| match e {
            ApplicationError::Domain(DomainError::Parse { line, message }) => {
                ApplicationError::Domain(DomainError::Parse {
                    line,
                    message: format!("{}: {}", path.display(), message),
                })
            }
            other => other,
        })
    }
}
