use crate::notifier::CompletionNotifier;
use crate::requester::CredentialRequester;
use crate::source::UploadFile;
use crate::transport::{HttpStorageTransport, StorageTransport, TransferProgressFn};
use crate::ApiClient;
use chrono::{DateTime, FixedOffset};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vidlift_core::models::progress::CONFIRM_BAND_END;
use vidlift_core::{
    ClientConfig, ConfirmationRecord, ConfirmedUpload, ErrorMetadata, LogLevel, ProgressEvent,
    UploadError, UploadResult, UploadStage,
};

/// Stage-aware progress callback
pub type StageProgressFn = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

const FINALIZING_LABEL: &str = "Finalizing upload...";

/// Optional inputs for one upload.
#[derive(Clone, Default)]
pub struct UploadOptions {
    pub duration_seconds: Option<f64>,
    pub thumbnail_ref: Option<String>,
    pub capture_datetime: Option<DateTime<FixedOffset>>,
    pub on_progress: Option<StageProgressFn>,
    pub cancel: Option<CancellationToken>,
}

impl UploadOptions {
    pub fn with_duration(mut self, duration_seconds: Option<f64>) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail_ref: Option<String>) -> Self {
        self.thumbnail_ref = thumbnail_ref;
        self
    }

    pub fn with_capture_datetime(mut self, capture_datetime: Option<DateTime<FixedOffset>>) -> Self {
        self.capture_datetime = capture_datetime;
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Forwards events to the caller, clamped to `0..=100` and never moving backwards.
#[derive(Clone)]
struct ProgressReporter {
    callback: Option<StageProgressFn>,
    // hundredths of a percent
    high_water: Arc<AtomicI64>,
}

impl ProgressReporter {
    fn new(callback: Option<StageProgressFn>) -> Self {
        Self {
            callback,
            high_water: Arc::new(AtomicI64::new(0)),
        }
    }

    fn emit(&self, mut event: ProgressEvent) {
        let Some(callback) = &self.callback else {
            return;
        };
        let scaled = (event.percent.clamp(0.0, 100.0) * 100.0).round() as i64;
        let previous = self.high_water.fetch_max(scaled, Ordering::Relaxed);
        event.percent = scaled.max(previous) as f64 / 100.0;
        callback(&event);
    }

    fn stage(&self, stage: UploadStage) {
        self.emit(ProgressEvent::stage_start(stage));
    }
}

fn log_failure(stage: UploadStage, err: &UploadError) {
    match err.log_level() {
        LogLevel::Error => {
            tracing::error!(stage = %stage, error_code = err.error_code(), error = %err, "Upload failed")
        }
        LogLevel::Warn => {
            tracing::warn!(stage = %stage, error_code = err.error_code(), error = %err, "Upload failed")
        }
        LogLevel::Debug => {
            tracing::debug!(stage = %stage, error_code = err.error_code(), error = %err, "Upload failed")
        }
    }
}

/// Runs request → transfer → confirm, in that order, failing fast.
///
/// Holds no per-upload state, so one `Uploader` can drive many uploads at once.
/// Every call requests a fresh credential; nothing is retried or deduplicated.
#[derive(Clone)]
pub struct Uploader {
    requester: Arc<dyn CredentialRequester>,
    transport: Arc<dyn StorageTransport>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl Uploader {
    pub fn new(
        requester: Arc<dyn CredentialRequester>,
        transport: Arc<dyn StorageTransport>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            requester,
            transport,
            notifier,
        }
    }

    /// HTTP implementations of all three phases.
    pub fn from_config(config: &ClientConfig) -> UploadResult<Self> {
        let api = Arc::new(ApiClient::from_config(config)?);
        let transport = Arc::new(HttpStorageTransport::from_config(config)?);
        Ok(Self::new(api.clone(), transport, api))
    }

    /// The notifier, for repeating a confirmation on its own with the record
    /// carried by [`UploadError::confirmation_record`].
    pub fn notifier(&self) -> &Arc<dyn CompletionNotifier> {
        &self.notifier
    }

    #[tracing::instrument(
        skip(self, file, options),
        fields(file_name = %file.file_name(), file_size = file.len())
    )]
    pub async fn upload(
        &self,
        file: UploadFile,
        options: UploadOptions,
    ) -> UploadResult<ConfirmedUpload> {
        let reporter = ProgressReporter::new(options.on_progress.clone());
        let cancel = options.cancel.clone().unwrap_or_default();
        let metadata = file
            .metadata()
            .with_duration(options.duration_seconds)
            .with_thumbnail(options.thumbnail_ref.clone());

        reporter.stage(UploadStage::RequestingCredential);
        let requested = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Network("cancelled".to_string())),
            result = self.requester.request_credential(&metadata) => result,
        };
        let credential = requested.map_err(|e| {
            log_failure(UploadStage::RequestingCredential, &e);
            e
        })?;

        reporter.stage(UploadStage::Transferring);
        let tick_reporter = reporter.clone();
        let on_transfer: TransferProgressFn =
            Arc::new(move |p| tick_reporter.emit(ProgressEvent::transfer_tick(p)));
        let receipt = self
            .transport
            .transfer(file, credential, Some(on_transfer), &cancel)
            .await
            .map_err(|e| {
                log_failure(UploadStage::Transferring, &e);
                e
            })?;

        reporter.stage(UploadStage::Confirming);
        let record = ConfirmationRecord::from_receipt(receipt)
            .with_duration(options.duration_seconds)
            .with_thumbnail(options.thumbnail_ref)
            .with_capture_datetime(options.capture_datetime);
        let confirmation = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::confirmation_failed("cancelled")),
            result = self.notifier.confirm(&record) => result,
        };
        let confirmed = confirmation.map_err(|e| {
            log_failure(UploadStage::Confirming, &e);
            e.with_confirmation_record(record)
        })?;
        reporter.emit(ProgressEvent::new(
            UploadStage::Confirming,
            FINALIZING_LABEL,
            CONFIRM_BAND_END,
        ));

        reporter.stage(UploadStage::Done);
        tracing::info!(asset_id = confirmed.asset_id, "Upload completed");
        Ok(confirmed)
    }
}
