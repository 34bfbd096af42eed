//! Error types module
//!
//! All lifecycle failures are unified under `AppError`. Storage backends keep
//! their own error type; the storage client maps it into `AppError` before it
//! reaches the lifecycle service.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    /// A physical delete was requested but no storage backend is configured.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The storage backend reported a failure for a specific URL.
    #[error("Storage delete failed for {url}: {message}")]
    StorageDeleteFailed { url: String, message: String },

    #[error("Storage upload failed: {0}")]
    StorageUploadFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Machine-readable error code (e.g., "DATABASE_ERROR")
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AppError::StorageDeleteFailed { .. } => "STORAGE_DELETE_FAILED",
            AppError::StorageUploadFailed(_) => "STORAGE_UPLOAD_FAILED",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the same call may succeed if retried.
    ///
    /// Lifecycle operations abort before mutating the registry on storage
    /// failures, so a recoverable error leaves nothing to undo.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Database(_)
            | AppError::StorageDeleteFailed { .. }
            | AppError::StorageUploadFailed(_) => true,
            AppError::StorageUnavailable(_)
            | AppError::InvalidInput(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => false,
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_have_stable_codes() {
        let unavailable = AppError::StorageUnavailable("no backend".into());
        assert_eq!(unavailable.error_code(), "STORAGE_UNAVAILABLE");
        assert!(!unavailable.is_recoverable());

        let failed = AppError::StorageDeleteFailed {
            url: "https://cdn.school.test/media/a.webp".into(),
            message: "timeout".into(),
        };
        assert_eq!(failed.error_code(), "STORAGE_DELETE_FAILED");
        assert!(failed.is_recoverable());
        assert!(failed.to_string().contains("a.webp"));
    }

    #[test]
    fn anyhow_errors_keep_their_message() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        match err {
            AppError::InternalWithSource { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
