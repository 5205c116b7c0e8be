pub mod progress;
pub mod upload;

pub use progress::{ProgressEvent, UploadStage};
pub use upload::{
    ConfirmationRecord, ConfirmedUpload, DownloadUrlResponse, ThumbnailUploadResponse,
    TransferReceipt, UploadCredential, UploadMetadata,
};
