//! Error types module
//!
//! All failures of an upload attempt are unified under [`UploadError`]. Each
//! variant names the phase that failed so a caller can tell "the upload URL
//! request failed" from "the bytes never landed" from "the bytes landed but
//! registration failed". Error text never carries the pre-signed URL or the
//! upload token.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::{ConfirmationRecord, UploadStage};
use crate::validation::ValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an upload error should be presented
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_TRANSFER_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether retrying can succeed (possibly from an earlier phase)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Phase-specific message suitable for a UI
    fn client_message(&self) -> String;

    /// Upload stage that failed, `None` for pre-flight failures
    fn stage(&self) -> Option<UploadStage>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Why the direct transfer to storage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFailure {
    /// Storage answered with a non-success HTTP status
    Status(u16),
    /// No response (connection, TLS, body stream error)
    Network,
    /// The caller cancelled the transfer
    Cancelled,
    /// The credential expired before the transfer started
    CredentialExpired,
}

impl Display for TransferFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TransferFailure::Status(code) => write!(f, "HTTP {}", code),
            TransferFailure::Network => write!(f, "network"),
            TransferFailure::Cancelled => write!(f, "cancelled"),
            TransferFailure::CredentialExpired => write!(f, "credential expired"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upload URL request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage transfer failed: {0}")]
    StorageTransferFailed(TransferFailure),

    /// The bytes are stored but the backend did not register them. When raised by
    /// an upload, `record` holds what is needed to repeat the confirmation.
    #[error("Upload confirmation failed: {reason}")]
    ConfirmationFailed {
        reason: String,
        record: Option<Box<ConfirmationRecord>>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

impl UploadError {
    /// A failed transfer invalidates the credential: start over from phase 1.
    pub fn requires_new_credential(&self) -> bool {
        matches!(self, UploadError::StorageTransferFailed(_))
    }

    /// The bytes are in storage; only the confirmation needs to be repeated.
    pub fn is_confirmation_only(&self) -> bool {
        matches!(self, UploadError::ConfirmationFailed { .. })
    }

    /// Confirmation failure without a record attached.
    pub fn confirmation_failed(reason: impl Into<String>) -> Self {
        UploadError::ConfirmationFailed {
            reason: reason.into(),
            record: None,
        }
    }

    /// Attach the record a confirmation failure can be retried with.
    /// Other variants are returned unchanged.
    pub fn with_confirmation_record(self, record: ConfirmationRecord) -> Self {
        match self {
            UploadError::ConfirmationFailed { reason, .. } => UploadError::ConfirmationFailed {
                reason,
                record: Some(Box::new(record)),
            },
            other => other,
        }
    }

    /// Record for repeating a failed confirmation through the notifier.
    pub fn confirmation_record(&self) -> Option<&ConfirmationRecord> {
        match self {
            UploadError::ConfirmationFailed { record, .. } => record.as_deref(),
            _ => None,
        }
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, stage, log_level).
fn upload_error_static_metadata(
    err: &UploadError,
) -> (
    &'static str,
    bool,
    Option<&'static str>,
    Option<UploadStage>,
    LogLevel,
) {
    match err {
        UploadError::Validation(_) => (
            "VALIDATION_ERROR",
            false,
            Some("Choose a supported video file within the size limit"),
            None,
            LogLevel::Debug,
        ),
        UploadError::RequestFailed(_) => (
            "REQUEST_FAILED",
            false,
            Some("Check the file details and try again"),
            Some(UploadStage::RequestingCredential),
            LogLevel::Warn,
        ),
        UploadError::Network(_) => (
            "NETWORK_ERROR",
            true,
            Some("Check your connection and retry the upload"),
            Some(UploadStage::RequestingCredential),
            LogLevel::Warn,
        ),
        UploadError::StorageTransferFailed(TransferFailure::Cancelled) => (
            "STORAGE_TRANSFER_CANCELLED",
            true,
            Some("Start the upload again when ready"),
            Some(UploadStage::Transferring),
            LogLevel::Debug,
        ),
        UploadError::StorageTransferFailed(_) => (
            "STORAGE_TRANSFER_FAILED",
            true,
            Some("Restart the upload to obtain a fresh upload URL"),
            Some(UploadStage::Transferring),
            LogLevel::Error,
        ),
        UploadError::ConfirmationFailed { .. } => (
            "CONFIRMATION_FAILED",
            true,
            Some("Retry the confirmation; the file is already stored"),
            Some(UploadStage::Confirming),
            LogLevel::Error,
        ),
        UploadError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check the client configuration"),
            None,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        upload_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::Validation(e) => e.to_string(),
            UploadError::RequestFailed(reason) => {
                format!("Upload URL request failed: {}", reason)
            }
            UploadError::Network(_) => {
                "Upload URL request failed: the server could not be reached".to_string()
            }
            UploadError::StorageTransferFailed(TransferFailure::Cancelled) => {
                "Upload cancelled".to_string()
            }
            UploadError::StorageTransferFailed(TransferFailure::CredentialExpired) => {
                "Network upload failed: the upload URL expired".to_string()
            }
            UploadError::StorageTransferFailed(failure) => {
                format!("Network upload failed ({})", failure)
            }
            UploadError::ConfirmationFailed { .. } => "Could not finalize upload".to_string(),
            UploadError::Config(reason) => format!("Client misconfigured: {}", reason),
        }
    }

    fn stage(&self) -> Option<UploadStage> {
        upload_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).4
    }
}
