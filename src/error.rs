//! Error handling module for pgprovision
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the application should use these types for consistency.

use thiserror::Error;

/// Main error type for pgprovision
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// IO errors (file operations, prompts, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation errors (malformed directory path, malformed address syntax)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The OS entropy source is unavailable; no credentials can be produced
    #[error("Random source unavailable: {0}")]
    RandomSource(String),

    /// A bundle write failed partway. Artifacts written before the failure
    /// stay on disk; `completed` records which ones.
    #[error("Filesystem error while writing {artifact}: {source}")]
    FileSystem {
        artifact: String,
        completed: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    /// The operator declined the pre-write confirmation
    #[error("Cancelled by operator; nothing was written")]
    Cancelled,
}

/// Result type alias for pgprovision operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a random-source error
    pub fn random_source(msg: impl Into<String>) -> Self {
        Self::RandomSource(msg.into())
    }

    /// Create a filesystem error naming the failed artifact and the
    /// artifacts that completed before it
    pub fn filesystem(
        artifact: impl Into<String>,
        completed: Vec<String>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            artifact: artifact.into(),
            completed,
            source,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProvisionError::validation("invalid address '10.0.0'");
        assert_eq!(
            err.to_string(),
            "Validation error: invalid address '10.0.0'"
        );

        let err = ProvisionError::random_source("getrandom failed");
        assert_eq!(
            err.to_string(),
            "Random source unavailable: getrandom failed"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ProvisionError = io_err.into();
        assert!(matches!(err, ProvisionError::Io(_)));
    }

    #[test]
    fn test_filesystem_error_reports_completed() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ProvisionError::filesystem(
            "access-control",
            vec!["env-file".to_string(), "compose-manifest".to_string()],
            io_err,
        );
        match &err {
            ProvisionError::FileSystem {
                artifact,
                completed,
                ..
            } => {
                assert_eq!(artifact, "access-control");
                assert_eq!(completed.len(), 2);
            }
            other => panic!("expected FileSystem error, got {:?}", other),
        }
        assert!(err.to_string().contains("access-control"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProvisionError::Cancelled.exit_code(), 2);
        assert_eq!(ProvisionError::validation("x").exit_code(), 1);
    }
}
