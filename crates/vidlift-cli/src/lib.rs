use chrono::{DateTime, FixedOffset};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use vidlift_core::{ProgressEvent, UploadStage};

/// Content type for a file: the explicit override, else a guess from the extension.
pub fn content_type_for(path: &Path, explicit: Option<&str>) -> String {
    match explicit {
        Some(content_type) => content_type.trim().to_ascii_lowercase(),
        None => mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

/// Parse an RFC 3339 capture time, e.g. `2024-05-01T14:30:00+02:00`.
pub fn parse_capture_datetime(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

/// Logs progress events, skipping transfer ticks that do not move a whole percent.
pub struct ProgressLog {
    last_logged: AtomicI64,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self {
            last_logged: AtomicI64::new(-1),
        }
    }

    /// Whether the event is worth a log line.
    pub fn should_log(&self, event: &ProgressEvent) -> bool {
        let whole = event.percent.floor() as i64;
        let previous = self.last_logged.fetch_max(whole, Ordering::Relaxed);
        event.stage != UploadStage::Transferring || whole > previous
    }

    pub fn record(&self, event: &ProgressEvent) {
        if self.should_log(event) {
            tracing::info!(
                stage = %event.stage,
                percent = format!("{:.1}", event.percent),
                "{}",
                event.stage_label
            );
        }
    }
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_guessed_from_extension() {
        assert_eq!(content_type_for(Path::new("cam1.mp4"), None), "video/mp4");
        assert_eq!(content_type_for(Path::new("clip.webm"), None), "video/webm");
        assert_eq!(
            content_type_for(Path::new("README"), None),
            "application/octet-stream"
        );
    }

    #[test]
    fn content_type_override_wins() {
        assert_eq!(
            content_type_for(Path::new("cam1.mp4"), Some(" Video/QuickTime ")),
            "video/quicktime"
        );
    }

    #[test]
    fn capture_datetime_parses_offset() {
        let parsed = parse_capture_datetime("2024-05-01T14:30:00+02:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 7200);
        assert!(parse_capture_datetime("yesterday").is_err());
    }

    #[test]
    fn progress_log_skips_sub_percent_ticks() {
        let log = ProgressLog::new();
        assert!(log.should_log(&ProgressEvent::stage_start(UploadStage::RequestingCredential)));
        assert!(log.should_log(&ProgressEvent::stage_start(UploadStage::Transferring)));
        assert!(log.should_log(&ProgressEvent::transfer_tick(10.0)));
        assert!(!log.should_log(&ProgressEvent::transfer_tick(10.5)));
        assert!(log.should_log(&ProgressEvent::stage_start(UploadStage::Confirming)));
    }
}
