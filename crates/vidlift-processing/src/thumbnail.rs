use crate::{validate_tool_path, ProcessingError, ProcessingResult};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(30);

/// Seconds into the video to grab the frame from.
///
/// The requested offset, capped at half the duration but never earlier than one
/// second. Unknown durations use the offset as is.
pub fn capture_offset(requested_secs: f64, duration_secs: Option<f64>) -> f64 {
    let requested = if requested_secs.is_finite() {
        requested_secs.max(0.0)
    } else {
        0.0
    };
    match duration_secs {
        Some(duration) if duration.is_finite() && duration > 0.0 => {
            requested.min((duration / 2.0).max(1.0))
        }
        _ => requested,
    }
}

/// Captures a single PNG frame with ffmpeg
#[derive(Debug, Clone)]
pub struct ThumbnailExtractor {
    ffmpeg_path: String,
}

impl ThumbnailExtractor {
    pub fn new(ffmpeg_path: impl Into<String>) -> ProcessingResult<Self> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path("ffmpeg", &ffmpeg_path)?;
        Ok(Self { ffmpeg_path })
    }

    /// Capture one frame at `offset_secs` and return the PNG bytes.
    #[tracing::instrument(skip(self), fields(path = %video.display()))]
    pub async fn capture_png(&self, video: &Path, offset_secs: f64) -> ProcessingResult<Vec<u8>> {
        let output_file = tempfile::Builder::new()
            .prefix("vidlift-thumb-")
            .suffix(".png")
            .tempfile()?;

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-ss")
            .arg(format!("{:.3}", offset_secs))
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1", "-f", "image2", "-vcodec", "png", "-y"])
            .arg(output_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(CAPTURE_TIMEOUT, command.output())
            .await
            .map_err(|_| ProcessingError::Timeout {
                tool: "ffmpeg",
                timeout: CAPTURE_TIMEOUT,
            })?
            .map_err(|source| ProcessingError::Spawn {
                tool: "ffmpeg",
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(stderr = %stderr, "ffmpeg thumbnail capture failed");
            return Err(ProcessingError::ToolFailed {
                tool: "ffmpeg",
                stderr,
            });
        }

        let png = tokio::fs::read(output_file.path()).await?;
        if png.is_empty() {
            return Err(ProcessingError::ToolFailed {
                tool: "ffmpeg",
                stderr: "no frame written".to_string(),
            });
        }
        tracing::debug!(bytes = png.len(), offset = offset_secs, "Thumbnail captured");
        Ok(png)
    }
}
