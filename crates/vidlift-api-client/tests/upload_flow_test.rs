//! End-to-end upload against mock backend and storage servers.

use mockito::Matcher;
use std::sync::{Arc, Mutex};
use vidlift_api_client::{ApiClient, Auth, HttpStorageTransport, UploadFile, UploadOptions, Uploader};
use vidlift_core::{ClientConfig, ProgressEvent, TransferFailure, UploadError};

const ONE_MIB: usize = 1024 * 1024;

fn config_for(server: &mockito::Server) -> ClientConfig {
    ClientConfig {
        api_url: server.url(),
        thumbnail_url: server.url(),
        auth_token: Some("jwt".to_string()),
        ..ClientConfig::default()
    }
}

fn credential_body(server: &mockito::Server) -> String {
    serde_json::json!({
        "upload_token": "t1",
        "presigned_url": format!("{}/storage/videos/t1?X-Amz-Signature=abc", server.url()),
        "s3_key": "videos/t1",
        "expires_in": 3600,
    })
    .to_string()
}

fn recording_options() -> (UploadOptions, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let options = UploadOptions::default()
        .with_duration(Some(12.0))
        .on_progress(move |event: &ProgressEvent| sink.lock().unwrap().push(event.clone()));
    (options, events)
}

#[tokio::test]
async fn test_cam1_upload_end_to_end() {
    let mut server = mockito::Server::new_async().await;

    let request = server
        .mock("POST", "/api/storage/upload/request/")
        .match_header("authorization", "Bearer jwt")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "file_name": "cam1.mp4",
            "file_size": ONE_MIB,
            "content_type": "video/mp4",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(credential_body(&server))
        .expect(1)
        .create_async()
        .await;

    let put = server
        .mock("PUT", "/storage/videos/t1")
        .match_query(Matcher::Any)
        .match_header("content-type", "video/mp4")
        .match_header("content-length", ONE_MIB.to_string().as_str())
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let confirm = server
        .mock("POST", "/api/storage/upload/confirm/")
        .match_header("authorization", "Bearer jwt")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "upload_token": "t1",
            "s3_key": "videos/t1",
            "duration": 12.0,
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"video_id":42,"video":{"id":42},"processing_queued":true}"#)
        .expect(1)
        .create_async()
        .await;

    let uploader = Uploader::from_config(&config_for(&server)).unwrap();
    let file = UploadFile::from_bytes("cam1.mp4", "video/mp4", vec![0u8; ONE_MIB]);
    let (options, events) = recording_options();

    let confirmed = uploader.upload(file, options).await.unwrap();
    assert_eq!(confirmed.asset_id, 42);

    let events = events.lock().unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.stage_label, "Upload completed!");
    assert_eq!(last.percent, 100.0);
    assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(events.iter().filter(|e| e.percent == 100.0).count(), 1);

    request.assert_async().await;
    put.assert_async().await;
    confirm.assert_async().await;
}

#[tokio::test]
async fn test_storage_rejection_skips_confirmation() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/api/storage/upload/request/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(credential_body(&server))
        .create_async()
        .await;
    server
        .mock("PUT", "/storage/videos/t1")
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;
    let confirm = server
        .mock("POST", "/api/storage/upload/confirm/")
        .expect(0)
        .create_async()
        .await;

    let uploader = Uploader::from_config(&config_for(&server)).unwrap();
    let file = UploadFile::from_bytes("cam1.mp4", "video/mp4", vec![0u8; 4096]);
    let (options, events) = recording_options();

    let err = uploader.upload(file, options).await.unwrap_err();
    assert!(matches!(
        err,
        UploadError::StorageTransferFailed(TransferFailure::Status(403))
    ));
    assert!(events.lock().unwrap().iter().all(|e| e.percent <= 80.0));
    confirm.assert_async().await;
}

#[tokio::test]
async fn test_confirmation_retry_with_returned_record() {
    let mut server = mockito::Server::new_async().await;

    let request = server
        .mock("POST", "/api/storage/upload/request/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(credential_body(&server))
        .expect(1)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/storage/videos/t1")
        .match_query(Matcher::Any)
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let failing_confirm = server
        .mock("POST", "/api/storage/upload/confirm/")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"db down"}"#)
        .expect(1)
        .create_async()
        .await;

    let api = Arc::new(ApiClient::new(server.url(), Auth::Bearer("jwt".to_string())).unwrap());
    let transport = Arc::new(HttpStorageTransport::from_config(&ClientConfig::default()).unwrap());
    let uploader = Uploader::new(api.clone(), transport, api);
    let file = UploadFile::from_bytes("cam1.mp4", "video/mp4", vec![0u8; 4096]);
    let (options, events) = recording_options();

    let err = uploader.upload(file, options).await.unwrap_err();
    assert!(err.is_confirmation_only());
    assert!(err.to_string().contains("db down"));
    assert!(events.lock().unwrap().iter().all(|e| e.percent <= 90.0));

    let record = err.confirmation_record().cloned().unwrap();
    assert_eq!(record.object_key(), "videos/t1");
    assert_eq!(record.upload_token(), "t1");
    assert_eq!(record.duration_seconds(), Some(12.0));
    failing_confirm.assert_async().await;
    failing_confirm.remove_async().await;

    let confirm = server
        .mock("POST", "/api/storage/upload/confirm/")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "upload_token": "t1",
            "s3_key": "videos/t1",
            "duration": 12.0,
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"video_id":42,"video":{"id":42}}"#)
        .expect(1)
        .create_async()
        .await;

    let confirmed = uploader.notifier().confirm(&record).await.unwrap();
    assert_eq!(confirmed.asset_id, 42);

    request.assert_async().await;
    put.assert_async().await;
    confirm.assert_async().await;
}
