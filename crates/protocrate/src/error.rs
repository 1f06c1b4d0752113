//! Error types for crate generation.

use std::io;

use thiserror::Error;

/// Errors that abort generation of a file.
///
/// Nothing here is transient: every variant is reported straight back to the
/// host toolchain and never retried.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Malformed generator options or crate mapping. Detected before any
    /// output is opened.
    #[error("{0}")]
    Configuration(String),

    /// The host handed us something that cannot happen with a well-behaved
    /// toolchain (empty compilation unit, unusable output path, unknown file).
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// An output stream could not be opened or written.
    #[error("failed to write {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a precondition violation.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create an output error for `path`.
    pub fn output(path: impl Into<String>, source: io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
