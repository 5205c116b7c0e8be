//! Vidlift Processing Library
//!
//! Local helpers run before an upload: duration extraction with ffprobe and
//! thumbnail capture with ffmpeg. Both are best effort; callers upload without
//! the result when they fail.

pub mod error;
pub mod probe;
pub mod thumbnail;

pub use error::{ProcessingError, ProcessingResult};
pub use probe::VideoProbe;
pub use thumbnail::{capture_offset, ThumbnailExtractor};

/// Reject tool paths that could smuggle shell syntax.
pub(crate) fn validate_tool_path(tool: &'static str, path: &str) -> ProcessingResult<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.trim().is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ProcessingError::InvalidToolPath {
            tool,
            path: path.to_string(),
        });
    }
    Ok(())
}
