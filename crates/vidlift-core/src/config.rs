//! Configuration module
//!
//! Client configuration loaded from the environment (and a `.env` file when
//! present). Every setting has a default so a bare environment points at a local
//! development backend.

use std::env;
use std::fmt;

use crate::validation::{
    MediaValidator, DEFAULT_MAX_VIDEO_SIZE_BYTES, DEFAULT_VIDEO_CONTENT_TYPES,
    DEFAULT_VIDEO_EXTENSIONS,
};

const API_URL: &str = "http://localhost:8001";
const PLACEHOLDER_TOKEN: &str = "demo_token";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const THUMBNAIL_OFFSET_SECS: f64 = 5.0;

/// Upload client configuration
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    /// Base URL of the thumbnail upload endpoint; defaults to `api_url`
    pub thumbnail_url: String,
    /// Bearer token for backend calls
    pub auth_token: Option<String>,
    /// Token substituted when `auth_token` is absent. `None` disables the fallback.
    pub placeholder_token: Option<String>,
    /// Timeout for backend calls; the storage transfer has no overall timeout
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_video_size_bytes: u64,
    pub video_content_types: Vec<String>,
    pub video_extensions: Vec<String>,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub thumbnail_offset_secs: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            thumbnail_url: API_URL.to_string(),
            auth_token: None,
            placeholder_token: Some(PLACEHOLDER_TOKEN.to_string()),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            max_video_size_bytes: DEFAULT_MAX_VIDEO_SIZE_BYTES,
            video_content_types: DEFAULT_VIDEO_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            thumbnail_offset_secs: THUMBNAIL_OFFSET_SECS,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("thumbnail_url", &self.thumbnail_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("placeholder_token", &self.placeholder_token)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("max_video_size_bytes", &self.max_video_size_bytes)
            .field("video_content_types", &self.video_content_types)
            .field("video_extensions", &self.video_extensions)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("ffprobe_path", &self.ffprobe_path)
            .field("thumbnail_offset_secs", &self.thumbnail_offset_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Load from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("VIDLIFT_API_URL")
            .or_else(|| lookup("API_URL"))
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.api_url);

        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "VIDLIFT_API_URL must start with http:// or https:// (got {})",
                api_url
            ));
        }

        let thumbnail_url = lookup("VIDLIFT_THUMBNAIL_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| api_url.clone());

        let auth_token = lookup("VIDLIFT_AUTH_TOKEN")
            .or_else(|| lookup("AUTH_TOKEN"))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        // An explicitly empty value turns the fallback off
        let placeholder_token = match lookup("VIDLIFT_PLACEHOLDER_TOKEN") {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value.trim().to_string()),
            None => defaults.placeholder_token,
        };

        let request_timeout_secs = lookup("VIDLIFT_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(REQUEST_TIMEOUT_SECS);

        let connect_timeout_secs = lookup("VIDLIFT_CONNECT_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(CONNECT_TIMEOUT_SECS);

        let max_video_size_bytes = match lookup("VIDLIFT_MAX_VIDEO_SIZE_BYTES") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("VIDLIFT_MAX_VIDEO_SIZE_BYTES must be a valid number")
            })?,
            None => defaults.max_video_size_bytes,
        };

        let video_content_types = lookup("VIDLIFT_VIDEO_CONTENT_TYPES")
            .map(|v| split_list(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.video_content_types);

        let video_extensions = lookup("VIDLIFT_VIDEO_EXTENSIONS")
            .map(|v| split_list(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.video_extensions);

        let thumbnail_offset_secs = lookup("VIDLIFT_THUMBNAIL_OFFSET_SECS")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(THUMBNAIL_OFFSET_SECS);

        Ok(Self {
            api_url,
            thumbnail_url,
            auth_token,
            placeholder_token,
            request_timeout_secs,
            connect_timeout_secs,
            max_video_size_bytes,
            video_content_types,
            video_extensions,
            ffmpeg_path: lookup("VIDLIFT_FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: lookup("VIDLIFT_FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            thumbnail_offset_secs,
        })
    }

    /// Validator built from the configured limits
    pub fn validator(&self) -> MediaValidator {
        MediaValidator::new(
            self.max_video_size_bytes,
            self.video_extensions.clone(),
            self.video_content_types.clone(),
        )
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, anyhow::Error> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_url, "http://localhost:8001");
        assert_eq!(config.thumbnail_url, "http://localhost:8001");
        assert_eq!(config.auth_token, None);
        assert_eq!(config.placeholder_token.as_deref(), Some("demo_token"));
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.max_video_size_bytes, DEFAULT_MAX_VIDEO_SIZE_BYTES);
        assert!(config.video_content_types.contains(&"video/mp4".to_string()));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("VIDLIFT_API_URL", "https://api.example.com/"),
            ("VIDLIFT_AUTH_TOKEN", "jwt"),
            ("VIDLIFT_REQUEST_TIMEOUT_SECS", "5"),
            ("VIDLIFT_VIDEO_CONTENT_TYPES", "video/mp4, VIDEO/WEBM"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.thumbnail_url, "https://api.example.com");
        assert_eq!(config.auth_token.as_deref(), Some("jwt"));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.video_content_types, vec!["video/mp4", "video/webm"]);
    }

    #[test]
    fn test_empty_placeholder_disables_fallback() {
        let config = load(&[("VIDLIFT_PLACEHOLDER_TOKEN", "")]).unwrap();
        assert_eq!(config.placeholder_token, None);
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(load(&[("VIDLIFT_API_URL", "localhost:8001")]).is_err());
    }

    #[test]
    fn test_invalid_max_size() {
        assert!(load(&[("VIDLIFT_MAX_VIDEO_SIZE_BYTES", "lots")]).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = load(&[("VIDLIFT_AUTH_TOKEN", "secret-jwt")]).unwrap();
        assert!(!format!("{:?}", config).contains("secret-jwt"));
    }
}
