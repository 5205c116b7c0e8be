use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

const REDACTED: &str = "<redacted>";

/// Client-declared description of the file, sent when requesting an upload credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// Original filename
    pub file_name: String,
    /// File size in bytes
    #[serde(rename = "file_size")]
    pub file_size_bytes: u64,
    /// Content type (MIME type)
    #[serde(rename = "content_type")]
    pub mime_type: String,
    /// Duration in seconds, when it could be probed before the upload
    #[serde(rename = "duration", default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Path or URL of an already uploaded thumbnail
    #[serde(
        rename = "thumbnail_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail_ref: Option<String>,
}

impl UploadMetadata {
    pub fn new(
        file_name: impl Into<String>,
        file_size_bytes: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_size_bytes,
            mime_type: mime_type.into(),
            duration_seconds: None,
            thumbnail_ref: None,
        }
    }

    pub fn with_duration(mut self, duration_seconds: Option<f64>) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail_ref: Option<String>) -> Self {
        self.thumbnail_ref = thumbnail_ref;
        self
    }
}

/// Short-lived upload credential issued by the backend.
///
/// Holds the opaque upload token and the pre-signed write URL. Neither value is
/// ever printed: `Debug` redacts both. The credential is not `Clone`; the storage
/// transport takes it by value and hands back a [`TransferReceipt`], so a single
/// credential can drive at most one transfer.
#[derive(Deserialize)]
pub struct UploadCredential {
    #[serde(rename = "upload_token")]
    token: String,
    #[serde(rename = "presigned_url")]
    write_url: String,
    #[serde(rename = "s3_key")]
    object_key: String,
    #[serde(rename = "expires_in")]
    expires_in_seconds: i64,
    #[serde(skip, default = "Instant::now")]
    issued_at: Instant,
}

impl UploadCredential {
    pub fn new(
        token: impl Into<String>,
        write_url: impl Into<String>,
        object_key: impl Into<String>,
        expires_in_seconds: i64,
    ) -> Self {
        Self {
            token: token.into(),
            write_url: write_url.into(),
            object_key: object_key.into(),
            expires_in_seconds,
            issued_at: Instant::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.expires_in_seconds
    }

    /// Time left before the credential must no longer be used.
    pub fn remaining(&self) -> Duration {
        let lifetime = Duration::from_secs(self.expires_in_seconds.max(0) as u64);
        lifetime.saturating_sub(self.issued_at.elapsed())
    }

    /// Expired credentials are rejected locally even if storage would still accept them.
    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Check the fields a usable credential must carry.
    pub fn check_usable(&self) -> Result<(), String> {
        if self.expires_in_seconds <= 0 {
            return Err(format!(
                "credential expires_in must be positive (got {})",
                self.expires_in_seconds
            ));
        }
        if self.token.trim().is_empty() {
            return Err("credential is missing upload_token".to_string());
        }
        if self.write_url.trim().is_empty() {
            return Err("credential is missing presigned_url".to_string());
        }
        if self.object_key.trim().is_empty() {
            return Err("credential is missing s3_key".to_string());
        }
        Ok(())
    }
}

impl fmt::Debug for UploadCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCredential")
            .field("token", &REDACTED)
            .field("write_url", &REDACTED)
            .field("object_key", &self.object_key)
            .field("expires_in_seconds", &self.expires_in_seconds)
            .finish()
    }
}

/// Proof that the bytes for a credential landed in storage.
///
/// Created by consuming the credential once the transfer succeeded; the write URL
/// does not survive into the receipt.
pub struct TransferReceipt {
    upload_token: String,
    object_key: String,
    bytes_sent: u64,
}

impl TransferReceipt {
    pub fn from_credential(credential: UploadCredential, bytes_sent: u64) -> Self {
        Self {
            upload_token: credential.token,
            object_key: credential.object_key,
            bytes_sent,
        }
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }
}

impl fmt::Debug for TransferReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferReceipt")
            .field("upload_token", &REDACTED)
            .field("object_key", &self.object_key)
            .field("bytes_sent", &self.bytes_sent)
            .finish()
    }
}

/// Body of the upload confirmation request
#[derive(Clone, Serialize)]
pub struct ConfirmationRecord {
    #[serde(rename = "s3_key")]
    object_key: String,
    upload_token: String,
    #[serde(rename = "duration", skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,
    #[serde(rename = "thumbnail_url", skip_serializing_if = "Option::is_none")]
    thumbnail_ref: Option<String>,
    #[serde(rename = "video_datetime", skip_serializing_if = "Option::is_none")]
    capture_datetime: Option<DateTime<FixedOffset>>,
}

impl ConfirmationRecord {
    pub fn from_receipt(receipt: TransferReceipt) -> Self {
        Self {
            object_key: receipt.object_key,
            upload_token: receipt.upload_token,
            duration_seconds: None,
            thumbnail_ref: None,
            capture_datetime: None,
        }
    }

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

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn upload_token(&self) -> &str {
        &self.upload_token
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds
    }

    pub fn thumbnail_ref(&self) -> Option<&str> {
        self.thumbnail_ref.as_deref()
    }

    pub fn capture_datetime(&self) -> Option<DateTime<FixedOffset>> {
        self.capture_datetime
    }
}

impl fmt::Debug for ConfirmationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationRecord")
            .field("object_key", &self.object_key)
            .field("upload_token", &REDACTED)
            .field("duration_seconds", &self.duration_seconds)
            .field("thumbnail_ref", &self.thumbnail_ref)
            .field("capture_datetime", &self.capture_datetime)
            .finish()
    }
}

/// Response after completing upload. The asset itself is owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedUpload {
    /// Server-assigned video id
    #[serde(rename = "video_id")]
    pub asset_id: i64,
    /// Backend video record
    #[serde(rename = "video", default)]
    pub asset: serde_json::Value,
}

/// Response of the thumbnail upload endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailUploadResponse {
    pub success: bool,
    #[serde(rename = "thumbnailPath", default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the download URL endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadUrlResponse {
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> UploadCredential {
        UploadCredential::new("t1", "https://store/x?X-Amz-Signature=abc", "videos/t1", 3600)
    }

    #[test]
    fn test_metadata_wire_names() {
        let metadata = UploadMetadata::new("cam1.mp4", 1_048_576, "video/mp4");
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "file_name": "cam1.mp4",
                "file_size": 1048576,
                "content_type": "video/mp4"
            })
        );

        let json = serde_json::to_value(
            metadata
                .with_duration(Some(12.5))
                .with_thumbnail(Some("/uploads/thumbnails/cam1.png".to_string())),
        )
        .unwrap();
        assert_eq!(json["duration"], 12.5);
        assert_eq!(json["thumbnail_url"], "/uploads/thumbnails/cam1.png");
    }

    #[test]
    fn test_credential_from_backend_json() {
        let credential: UploadCredential = serde_json::from_value(serde_json::json!({
            "upload_token": "t1",
            "presigned_url": "https://store/x",
            "s3_key": "videos/t1",
            "expires_in": 900
        }))
        .unwrap();

        assert_eq!(credential.token(), "t1");
        assert_eq!(credential.write_url(), "https://store/x");
        assert_eq!(credential.object_key(), "videos/t1");
        assert_eq!(credential.expires_in_seconds(), 900);
        assert!(!credential.is_expired());
        assert!(credential.check_usable().is_ok());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let rendered = format!("{:?}", credential());
        assert!(!rendered.contains("X-Amz-Signature"));
        assert!(!rendered.contains("\"t1\""));
        assert!(rendered.contains("videos/t1"));
    }

    #[test]
    fn test_credential_non_positive_expiry() {
        let credential = UploadCredential::new("t1", "https://store/x", "videos/t1", 0);
        assert!(credential.is_expired());
        assert!(credential.check_usable().is_err());

        let credential = UploadCredential::new("t1", "https://store/x", "videos/t1", -5);
        assert!(credential.check_usable().is_err());
    }

    #[test]
    fn test_credential_missing_fields() {
        let credential = UploadCredential::new("t1", "", "videos/t1", 60);
        assert!(credential
            .check_usable()
            .unwrap_err()
            .contains("presigned_url"));
    }

    #[test]
    fn test_confirmation_record_from_receipt() {
        let receipt = TransferReceipt::from_credential(credential(), 1_048_576);
        assert_eq!(receipt.bytes_sent(), 1_048_576);

        let captured = DateTime::parse_from_rfc3339("2024-01-15T09:30:00+09:00").unwrap();
        let record = ConfirmationRecord::from_receipt(receipt)
            .with_duration(Some(120.5))
            .with_capture_datetime(Some(captured));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["upload_token"], "t1");
        assert_eq!(json["s3_key"], "videos/t1");
        assert_eq!(json["duration"], 120.5);
        assert_eq!(json["video_datetime"], "2024-01-15T09:30:00+09:00");
        assert!(json.get("thumbnail_url").is_none());
        assert!(!format!("{:?}", record).contains("\"t1\""));
    }

    #[test]
    fn test_confirmed_upload_from_backend_json() {
        let confirmed: ConfirmedUpload = serde_json::from_value(serde_json::json!({
            "success": true,
            "video_id": 42,
            "message": "done",
            "video": { "name": "cam1.mp4" },
            "processing_queued": true
        }))
        .unwrap();
        assert_eq!(confirmed.asset_id, 42);
        assert_eq!(confirmed.asset["name"], "cam1.mp4");
    }
}
