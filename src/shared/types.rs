use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::error::{AppError, Result};
use crate::shared::constants::IMAGE_URL_PREFIX;

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// IMAGES
// =============================================================================

/// Image metadata as projected by the server.
///
/// The client only ever holds the current page; the server stays authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub upload_time: Option<NaiveDateTime>,
}

impl Image {
    /// Direct link to the stored file
    pub fn direct_url(&self, base_url: &str) -> String {
        format!(
            "{}{}{}",
            base_url.trim_end_matches('/'),
            IMAGE_URL_PREFIX,
            self.filename
        )
    }

    pub fn markdown_link(&self, base_url: &str) -> String {
        format!("![{}]({})", self.original_name, self.direct_url(base_url))
    }

    pub fn dimensions(&self) -> String {
        format!("{}×{}", self.width, self.height)
    }

    pub fn display_size(&self) -> String {
        format_size(self.size)
    }
}

/// One page of the gallery listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePage {
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
    pub current_page: u32,
}

/// Human readable byte size: `KB` below one megabyte, `MB` above
pub fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes > MB {
        format!("{:.1} MB", bytes / MB)
    } else {
        format!("{:.1} KB", bytes / 1024.0)
    }
}

// =============================================================================
// UPLOAD PAYLOAD
// =============================================================================

/// Raw file handed to the upload pipeline.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Arc<[u8]>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            data: Arc::from(data.into()),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk, keeping only its file name
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Validation(format!("Cannot read {}: {}", path.display(), e)))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                AppError::Validation(format!("Invalid file name: {}", path.display()))
            })?
            .to_string();

        Ok(Self::new(name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}
