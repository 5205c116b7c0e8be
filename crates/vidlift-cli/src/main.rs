//! Vidlift CLI: upload a video straight to storage through the backend.
//!
//! Reads `VIDLIFT_*` settings from the environment (or `.env`).

use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vidlift_api_client::{ApiClient, CancellationToken, UploadFile, UploadOptions, Uploader};
use vidlift_cli::{content_type_for, init_tracing, parse_capture_datetime, ProgressLog};
use vidlift_core::{ClientConfig, ErrorMetadata};
use vidlift_processing::{capture_offset, ThumbnailExtractor, VideoProbe};

#[derive(Parser)]
#[command(name = "vidlift", about = "Direct-to-storage video uploader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a video file
    Upload {
        /// Path to the video
        file: PathBuf,
        /// Content type to declare instead of guessing from the extension
        #[arg(long)]
        content_type: Option<String>,
        /// Capture time of the recording (RFC 3339)
        #[arg(long, value_parser = parse_capture_datetime)]
        datetime: Option<DateTime<FixedOffset>>,
        /// Skip thumbnail capture and upload
        #[arg(long)]
        no_thumbnail: bool,
        /// Skip the ffprobe duration lookup
        #[arg(long)]
        no_probe: bool,
    },
    /// Get a download URL for an uploaded video
    DownloadUrl {
        /// Video id returned by the upload
        video_id: i64,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn probe_duration(config: &ClientConfig, path: &Path) -> Option<f64> {
    let probe = match VideoProbe::new(config.ffprobe_path.clone()) {
        Ok(probe) => probe,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping duration probe");
            return None;
        }
    };
    match probe.duration(path).await {
        Ok(seconds) => Some(seconds),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read video duration, uploading without it");
            None
        }
    }
}

async fn make_thumbnail(
    config: &ClientConfig,
    api: &ApiClient,
    path: &Path,
    file_name: &str,
    duration: Option<f64>,
) -> Option<String> {
    let extractor = match ThumbnailExtractor::new(config.ffmpeg_path.clone()) {
        Ok(extractor) => extractor,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping thumbnail");
            return None;
        }
    };
    let offset = capture_offset(config.thumbnail_offset_secs, duration);
    let png = match extractor.capture_png(path, offset).await {
        Ok(png) => png,
        Err(e) => {
            tracing::warn!(error = %e, "Thumbnail capture failed, uploading without it");
            return None;
        }
    };
    match api.upload_thumbnail(png, file_name).await {
        Ok(thumbnail_path) => Some(thumbnail_path),
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Thumbnail upload failed, uploading without it");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Upload {
            file,
            content_type,
            datetime,
            no_thumbnail,
            no_probe,
        } => {
            let content_type = content_type_for(&file, content_type.as_deref());
            let source = UploadFile::open(&file, content_type.clone())
                .await
                .with_context(|| format!("Failed to open file: {}", file.display()))?;

            config
                .validator()
                .validate_all(source.file_name(), &content_type, source.len())
                .with_context(|| format!("{} cannot be uploaded", file.display()))?;

            let api = ApiClient::from_config(&config).context("Failed to create API client")?;

            let duration = if no_probe {
                None
            } else {
                probe_duration(&config, &file).await
            };
            let thumbnail = if no_thumbnail {
                None
            } else {
                make_thumbnail(&config, &api, &file, source.file_name(), duration).await
            };

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, cancelling upload");
                    ctrl_c.cancel();
                }
            });

            let progress = Arc::new(ProgressLog::new());
            let options = UploadOptions::default()
                .with_duration(duration)
                .with_thumbnail(thumbnail)
                .with_capture_datetime(datetime)
                .with_cancel(cancel)
                .on_progress(move |event| progress.record(event));

            let uploader = Uploader::from_config(&config).context("Failed to create uploader")?;
            let confirmed = uploader.upload(source, options).await.map_err(|e| {
                let message = match e.suggested_action() {
                    Some(action) => {
                        format!("{} [{}]. {}", e.client_message(), e.error_code(), action)
                    }
                    None => format!("{} [{}]", e.client_message(), e.error_code()),
                };
                anyhow::Error::new(e).context(message)
            })?;
            print_json(&confirmed)?;
        }
        Commands::DownloadUrl { video_id } => {
            let api = ApiClient::from_config(&config).context("Failed to create API client")?;
            let url = api.video_download_url(video_id).await?;
            print_json(&serde_json::json!({ "video_id": video_id, "download_url": url }))?;
        }
    }

    Ok(())
}
