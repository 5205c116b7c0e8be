//! Collaborator endpoints around the upload protocol: thumbnail storage and
//! download URL lookup.

use crate::{ApiClient, THUMBNAIL_PATH};
use anyhow::{Context, Result};
use std::path::Path;
use vidlift_core::models::{DownloadUrlResponse, ThumbnailUploadResponse};

/// Directory the thumbnail endpoint stores files under
const THUMBNAIL_DIR: &str = "/uploads/thumbnails";

/// `<stem>.png` for a video file name, ignoring any directory components.
pub fn thumbnail_file_name(video_file_name: &str) -> String {
    let stem = Path::new(video_file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("thumbnail");
    format!("{}.png", stem)
}

impl ApiClient {
    /// Upload a PNG thumbnail for a video and return its stored path.
    ///
    /// Callers treat any error as "no thumbnail"; the upload continues without one.
    #[tracing::instrument(skip(self, png), fields(bytes = png.len()))]
    pub async fn upload_thumbnail(&self, png: Vec<u8>, video_file_name: &str) -> Result<String> {
        let file_name = thumbnail_file_name(video_file_name);
        let part = reqwest::multipart::Part::bytes(png)
            .file_name(file_name.clone())
            .mime_str("image/png")
            .context("Failed to build thumbnail part")?;
        let form = reqwest::multipart::Form::new()
            .part("thumbnail", part)
            .text("fileName", file_name.clone());

        let request = self
            .client
            .post(format!("{}{}", self.thumbnail_url, THUMBNAIL_PATH))
            .timeout(self.request_timeout)
            .multipart(form);
        let response: ThumbnailUploadResponse = Self::send_for_json(request).await?;

        if !response.success {
            return Err(anyhow::anyhow!(
                "Thumbnail upload failed: {}",
                response.error.unwrap_or_else(|| "unknown error".to_string())
            ));
        }

        let path = response
            .thumbnail_path
            .unwrap_or_else(|| format!("{}/{}", THUMBNAIL_DIR, file_name));
        tracing::info!(thumbnail_path = %path, "Thumbnail uploaded");
        Ok(path)
    }

    /// Fetch a time-limited download URL for a confirmed video.
    pub async fn video_download_url(&self, video_id: i64) -> Result<String> {
        let request = self.apply_auth(
            self.client
                .get(self.build_url(&format!("/api/storage/video/{}/download/", video_id)))
                .timeout(self.request_timeout),
        );
        let response: DownloadUrlResponse = Self::send_for_json(request)
            .await
            .with_context(|| format!("Failed to get download URL for video {}", video_id))?;
        Ok(response.download_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Auth;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> ApiClient {
        ApiClient::new(server.url(), Auth::Bearer("jwt".to_string())).unwrap()
    }

    #[test]
    fn test_thumbnail_file_name() {
        assert_eq!(thumbnail_file_name("cam1.mp4"), "cam1.png");
        assert_eq!(thumbnail_file_name("holiday.clip.mov"), "holiday.clip.png");
        assert_eq!(thumbnail_file_name("../../etc/passwd.mp4"), "passwd.png");
        assert_eq!(thumbnail_file_name(""), "thumbnail.png");
    }

    #[tokio::test]
    async fn test_upload_thumbnail_returns_stored_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", THUMBNAIL_PATH)
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex("name=\"fileName\"".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"thumbnailPath":"/uploads/thumbnails/cam1.png"}"#)
            .create_async()
            .await;

        let path = client(&server)
            .upload_thumbnail(vec![0x89, b'P', b'N', b'G'], "cam1.mp4")
            .await
            .unwrap();
        assert_eq!(path, "/uploads/thumbnails/cam1.png");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_thumbnail_reported_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", THUMBNAIL_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false,"error":"disk full"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .upload_thumbnail(vec![1, 2, 3], "cam1.mp4")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }

    #[tokio::test]
    async fn test_video_download_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/storage/video/42/download/")
            .match_header("authorization", "Bearer jwt")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"download_url":"https://bucket.example/videos/t1?sig=y"}"#)
            .create_async()
            .await;

        let url = client(&server).video_download_url(42).await.unwrap();
        assert_eq!(url, "https://bucket.example/videos/t1?sig=y");
    }

    #[tokio::test]
    async fn test_video_download_url_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/storage/video/9/download/")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Video not found"}"#)
            .create_async()
            .await;

        let err = client(&server).video_download_url(9).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Video not found"));
    }
}
