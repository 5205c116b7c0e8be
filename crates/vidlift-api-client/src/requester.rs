use crate::{describe_reqwest_error, error_reason, ApiClient, REQUEST_PATH};
use async_trait::async_trait;
use vidlift_core::{UploadCredential, UploadError, UploadMetadata, UploadResult};

/// First phase: obtain an upload token and a pre-signed write URL.
#[async_trait]
pub trait CredentialRequester: Send + Sync {
    /// Every credential returned has `expires_in_seconds() > 0`.
    async fn request_credential(&self, metadata: &UploadMetadata) -> UploadResult<UploadCredential>;
}

#[async_trait]
impl CredentialRequester for ApiClient {
    #[tracing::instrument(
        skip(self, metadata),
        fields(
            file_name = %metadata.file_name,
            file_size = metadata.file_size_bytes,
            content_type = %metadata.mime_type,
        )
    )]
    async fn request_credential(&self, metadata: &UploadMetadata) -> UploadResult<UploadCredential> {
        let response = self
            .post_json(REQUEST_PATH, metadata)
            .send()
            .await
            .map_err(|e| UploadError::Network(describe_reqwest_error(e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = error_reason(response).await;
            tracing::warn!(status = status, reason = %reason, "Upload credential request rejected");
            return Err(UploadError::RequestFailed(reason));
        }

        let credential: UploadCredential = response.json().await.map_err(|e| {
            UploadError::RequestFailed(format!(
                "invalid credential response: {}",
                describe_reqwest_error(e)
            ))
        })?;
        credential
            .check_usable()
            .map_err(UploadError::RequestFailed)?;

        tracing::info!(
            object_key = %credential.object_key(),
            expires_in = credential.expires_in_seconds(),
            "Upload credential issued"
        );
        Ok(credential)
    }
}
