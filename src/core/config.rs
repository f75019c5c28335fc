use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    pub gallery: GalleryConfig,
}

/// Remote image host connection settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the image host, without trailing slash
    pub base_url: String,
    /// Transport-level timeout applied to every request; None waits indefinitely
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// How long a drained batch stays visible before the queue is cleared
    pub grace_window: Duration,
    /// Slider value used when the user has not picked one
    pub default_quality: u8,
    /// Size of the body chunks handed to the transport; progress granularity
    pub chunk_size: usize,
}

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Header shown above the gallery when no owner filter is active
    pub header_text: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            server: ServerConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            upload: UploadConfig::from_env()?,
            gallery: GalleryConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:5000";

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("IMGHOST_BASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(format!(
                "IMGHOST_BASE_URL must start with http:// or https://, got '{}'",
                base_url
            ));
        }

        let request_timeout =
            parse_request_timeout(env::var("IMGHOST_REQUEST_TIMEOUT_SECS").ok().as_deref())?;

        Ok(Self {
            base_url,
            request_timeout,
        })
    }
}

/// Unset, empty or zero disables the timeout
fn parse_request_timeout(value: Option<&str>) -> Result<Option<Duration>, String> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let secs = value
        .parse::<u64>()
        .map_err(|_| "IMGHOST_REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("IMGHOST_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("IMGHOST_PASSWORD").ok().filter(|s| !s.is_empty());

        Ok(Self { username, password })
    }

    /// Returns (username, password) if both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

impl UploadConfig {
    const DEFAULT_GRACE_WINDOW_MS: u64 = 3000;
    const DEFAULT_QUALITY: u8 = 80;
    const DEFAULT_CHUNK_SIZE: usize = 64 * 1024; // 64KB

    pub fn from_env() -> Result<Self, String> {
        let grace_window_ms = env::var("UPLOAD_GRACE_WINDOW_MS")
            .unwrap_or_else(|_| Self::DEFAULT_GRACE_WINDOW_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "UPLOAD_GRACE_WINDOW_MS must be a valid number".to_string())?;

        let default_quality = env::var("UPLOAD_DEFAULT_QUALITY")
            .unwrap_or_else(|_| Self::DEFAULT_QUALITY.to_string())
            .parse::<u8>()
            .map_err(|_| "UPLOAD_DEFAULT_QUALITY must be a number between 1 and 100".to_string())?;

        if !(1..=100).contains(&default_quality) {
            return Err("UPLOAD_DEFAULT_QUALITY must be a number between 1 and 100".to_string());
        }

        let chunk_size = env::var("UPLOAD_CHUNK_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_CHUNK_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "UPLOAD_CHUNK_SIZE must be a valid number".to_string())?;

        if chunk_size == 0 {
            return Err("UPLOAD_CHUNK_SIZE must be greater than zero".to_string());
        }

        Ok(Self {
            grace_window: Duration::from_millis(grace_window_ms),
            default_quality,
            chunk_size,
        })
    }
}

impl GalleryConfig {
    pub fn from_env() -> Result<Self, String> {
        let header_text =
            env::var("GALLERY_HEADER_TEXT").unwrap_or_else(|_| "My Images".to_string());

        Ok(Self { header_text })
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            grace_window: Duration::from_millis(Self::DEFAULT_GRACE_WINDOW_MS),
            default_quality: Self::DEFAULT_QUALITY,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}
