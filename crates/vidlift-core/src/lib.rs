//! Vidlift Core Library
//!
//! Domain models, error types, configuration, and pre-flight validation shared by
//! the upload client, the on-device processing helpers, and the CLI.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ErrorMetadata, LogLevel, TransferFailure, UploadError, UploadResult};
pub use models::{
    ConfirmationRecord, ConfirmedUpload, ProgressEvent, TransferReceipt, UploadCredential,
    UploadMetadata, UploadStage,
};
pub use validation::{MediaValidator, ValidationError};
