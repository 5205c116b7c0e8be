use crate::{validate_tool_path, ProcessingError, ProcessingResult};
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

/// Parse the container duration out of `ffprobe -show_format -of json` output.
pub fn parse_duration(stdout: &[u8]) -> ProcessingResult<f64> {
    let output: FFprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| ProcessingError::Parse(e.to_string()))?;

    let duration = output
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| ProcessingError::Parse("no duration in format section".to_string()))?;
    let seconds: f64 = duration
        .trim()
        .parse()
        .map_err(|_| ProcessingError::Parse(format!("invalid duration {:?}", duration)))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ProcessingError::Parse(format!(
            "duration must be positive, got {}",
            seconds
        )));
    }
    Ok(seconds)
}

/// Reads video duration with ffprobe
#[derive(Debug, Clone)]
pub struct VideoProbe {
    ffprobe_path: String,
}

impl VideoProbe {
    pub fn new(ffprobe_path: impl Into<String>) -> ProcessingResult<Self> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path("ffprobe", &ffprobe_path)?;
        Ok(Self { ffprobe_path })
    }

    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    pub async fn duration(&self, path: &Path) -> ProcessingResult<f64> {
        let mut command = Command::new(&self.ffprobe_path);
        command
            .args(["-v", "error", "-show_format", "-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(PROBE_TIMEOUT, command.output())
            .await
            .map_err(|_| ProcessingError::Timeout {
                tool: "ffprobe",
                timeout: PROBE_TIMEOUT,
            })?
            .map_err(|source| ProcessingError::Spawn {
                tool: "ffprobe",
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(stderr = %stderr, "ffprobe failed");
            return Err(ProcessingError::ToolFailed {
                tool: "ffprobe",
                stderr,
            });
        }

        let seconds = parse_duration(&output.stdout)?;
        tracing::debug!(duration = seconds, "Video duration probed");
        Ok(seconds)
    }
}
