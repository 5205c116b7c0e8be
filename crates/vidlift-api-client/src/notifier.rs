use crate::{describe_reqwest_error, error_reason, ApiClient, CONFIRM_PATH};
use async_trait::async_trait;
use vidlift_core::{ConfirmationRecord, ConfirmedUpload, UploadError, UploadResult};

/// Final phase: tell the backend the object is in storage.
///
/// A [`ConfirmationRecord`] only exists once a transfer succeeded. The record is
/// `Clone`, so a failed confirmation can be retried on its own.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn confirm(&self, record: &ConfirmationRecord) -> UploadResult<ConfirmedUpload>;
}

#[async_trait]
impl CompletionNotifier for ApiClient {
    #[tracing::instrument(skip(self, record), fields(object_key = %record.object_key()))]
    async fn confirm(&self, record: &ConfirmationRecord) -> UploadResult<ConfirmedUpload> {
        let response = self
            .post_json(CONFIRM_PATH, record)
            .send()
            .await
            .map_err(|e| UploadError::confirmation_failed(describe_reqwest_error(e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = error_reason(response).await;
            tracing::warn!(status = status, reason = %reason, "Upload confirmation rejected");
            return Err(UploadError::confirmation_failed(reason));
        }

        let confirmed: ConfirmedUpload = response.json().await.map_err(|e| {
            UploadError::confirmation_failed(format!(
                "invalid confirmation response: {}",
                describe_reqwest_error(e)
            ))
        })?;

        tracing::info!(asset_id = confirmed.asset_id, "Upload confirmed");
        Ok(confirmed)
    }
}
