use std::time::Duration;

/// Errors from the local video helpers
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Invalid {tool} path: {path:?}")]
    InvalidToolPath { tool: &'static str, path: String },

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: &'static str, stderr: String },

    #[error("{tool} timed out after {timeout:?}")]
    Timeout {
        tool: &'static str,
        timeout: Duration,
    },

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;
