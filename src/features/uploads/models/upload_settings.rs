use serde::{Deserialize, Serialize};

use crate::shared::constants::{MAX_QUALITY, MIN_QUALITY};

/// What the server is told to do with one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Recompression quality, 1-100
    pub quality: u8,
    /// Store the bytes untouched
    pub passthrough: bool,
}

/// Upload controls as the user left them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityPreferences {
    /// Keep the original bytes, no recompression at all
    pub strict: bool,
    /// Recompress at full quality
    pub original: bool,
    /// Slider value
    pub quality: u8,
}

impl QualityPreferences {
    pub fn with_quality(quality: u8) -> Self {
        Self {
            strict: false,
            original: false,
            quality,
        }
    }

    /// Settings for files enqueued now, given the admin ceiling.
    ///
    /// Strict wins over original; otherwise the slider is clamped to
    /// `[1, ceiling]`.
    pub fn resolve(&self, ceiling: u8) -> UploadSettings {
        if self.strict {
            return UploadSettings {
                quality: MAX_QUALITY,
                passthrough: true,
            };
        }

        if self.original {
            return UploadSettings {
                quality: MAX_QUALITY,
                passthrough: false,
            };
        }

        let ceiling = ceiling.clamp(MIN_QUALITY, MAX_QUALITY);
        UploadSettings {
            quality: self.quality.clamp(MIN_QUALITY, ceiling),
            passthrough: false,
        }
    }
}

/// Full-quality modes are only offered when the admin allows 100
pub fn original_mode_available(ceiling: u8) -> bool {
    ceiling >= MAX_QUALITY
}
