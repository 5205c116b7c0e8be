use crate::source::UploadFile;
use crate::describe_reqwest_error;
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use vidlift_core::{
    ClientConfig, TransferFailure, TransferReceipt, UploadCredential, UploadError, UploadResult,
};

/// Transfer progress callback, receives `0.0..=100.0`
pub type TransferProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

const CHUNK_SIZE: usize = 256 * 1024;

/// Second phase: move the bytes straight to storage using a pre-signed URL.
///
/// The credential is taken by value; a successful transfer turns it into a
/// [`TransferReceipt`], the only input from which a confirmation can be built.
#[async_trait]
pub trait StorageTransport: Send + Sync {
    async fn transfer(
        &self,
        file: UploadFile,
        credential: UploadCredential,
        on_progress: Option<TransferProgressFn>,
        cancel: &CancellationToken,
    ) -> UploadResult<TransferReceipt>;
}

/// Single-PUT transport over reqwest.
///
/// The client carries no overall timeout so long transfers are not cut short.
/// Only the connect phase is bounded.
#[derive(Clone, Debug)]
pub struct HttpStorageTransport {
    client: Client,
}

impl HttpStorageTransport {
    pub fn new(connect_timeout: Duration) -> UploadResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| UploadError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ClientConfig) -> UploadResult<Self> {
        Self::new(Duration::from_secs(config.connect_timeout_secs))
    }
}

/// Turns byte counts into non-decreasing percentages.
struct ProgressCounter {
    total: u64,
    sent: AtomicU64,
    // hundredths of a percent, -1 before the first report
    last_reported: AtomicI64,
    callback: Option<TransferProgressFn>,
}

impl ProgressCounter {
    fn new(total: u64, callback: Option<TransferProgressFn>) -> Self {
        Self {
            total,
            sent: AtomicU64::new(0),
            last_reported: AtomicI64::new(-1),
            callback,
        }
    }

    fn percent(&self, sent: u64) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (sent as f64 / self.total as f64 * 100.0).min(100.0)
    }

    fn advance(&self, bytes: usize) {
        let sent = self.sent.fetch_add(bytes as u64, Ordering::Relaxed) + bytes as u64;
        self.report(self.percent(sent));
    }

    fn report(&self, percent: f64) {
        let Some(callback) = &self.callback else {
            return;
        };
        let scaled = (percent * 100.0).round() as i64;
        let previous = self.last_reported.fetch_max(scaled, Ordering::Relaxed);
        if scaled > previous {
            callback(percent);
        }
    }

    fn start(&self) {
        self.report(self.percent(0));
    }

    fn finish(&self) {
        self.report(100.0);
    }

    fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StorageTransport for HttpStorageTransport {
    #[tracing::instrument(
        skip_all,
        fields(object_key = %credential.object_key(), bytes = file.len())
    )]
    async fn transfer(
        &self,
        file: UploadFile,
        credential: UploadCredential,
        on_progress: Option<TransferProgressFn>,
        cancel: &CancellationToken,
    ) -> UploadResult<TransferReceipt> {
        if credential.is_expired() {
            tracing::warn!("Upload credential expired before transfer started");
            return Err(UploadError::StorageTransferFailed(
                TransferFailure::CredentialExpired,
            ));
        }
        if cancel.is_cancelled() {
            return Err(UploadError::StorageTransferFailed(TransferFailure::Cancelled));
        }

        let total = file.len();
        let content_type = file.content_type().to_string();
        let counter = Arc::new(ProgressCounter::new(total, on_progress));
        counter.start();

        let stream_counter = counter.clone();
        let stream = ReaderStream::with_capacity(file.into_reader(), CHUNK_SIZE)
            .inspect_ok(move |chunk| stream_counter.advance(chunk.len()));

        let request = self
            .client
            .put(credential.write_url())
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(stream));

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(bytes_sent = counter.sent(), "Storage transfer cancelled");
                return Err(UploadError::StorageTransferFailed(TransferFailure::Cancelled));
            }
            result = request.send() => result.map_err(|e| {
                tracing::warn!(error = %describe_reqwest_error(e), "Storage transfer failed");
                UploadError::StorageTransferFailed(TransferFailure::Network)
            })?,
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Storage rejected the transfer");
            return Err(UploadError::StorageTransferFailed(TransferFailure::Status(
                status.as_u16(),
            )));
        }

        counter.finish();
        tracing::info!(bytes_sent = total, "Storage transfer complete");
        Ok(TransferReceipt::from_credential(credential, total))
    }
}
