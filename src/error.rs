//! Centralized error types for mailtree.
//!
//! Only conditions that make the whole parse meaningless are errors.
//! Local anomalies (a bad address, an unknown charset, broken base64) are
//! recorded as [`DecodeWarning`](crate::model::warning::DecodeWarning)s instead.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors produced by the mailtree library.
#[derive(Error, Debug)]
pub enum MailError {
    /// Strict mode only: the header section never reached a blank line.
    #[error("Malformed header section starting at offset {offset}: no blank line before end of input")]
    MalformedHeader { offset: usize },

    /// The MIME tree nests deeper than the configured bound.
    #[error("MIME nesting exceeds the configured limit of {limit} levels")]
    ExcessiveNesting { limit: usize },

    /// The decoded content of the message grew beyond the configured cap.
    #[error("Decoded content would reach {attempted} bytes, above the configured limit of {limit}")]
    ResourceLimitExceeded { limit: usize, attempted: usize },

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("Message file not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience alias for `Result<T, MailError>`.
pub type Result<T> = std::result::Result<T, MailError>;

impl MailError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for the limits that protect against adversarial input.
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self,
            Self::ExcessiveNesting { .. } | Self::ResourceLimitExceeded { .. }
        )
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `MailError::io`).
impl From<std::io::Error> for MailError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MailError::ExcessiveNesting { limit: 100 };
        assert_eq!(
            err.to_string(),
            "MIME nesting exceeds the configured limit of 100 levels"
        );
        assert!(err.is_resource_limit());

        let err = MailError::MalformedHeader { offset: 0 };
        assert!(err.to_string().contains("no blank line"));
        assert!(!err.is_resource_limit());
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let err = MailError::io(
            "/tmp/missing.eml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/missing.eml"));
    }
}
