mod upload_item;
mod upload_queue;
mod upload_settings;

pub use upload_item::{UploadId, UploadItem, UploadStatus};
pub use upload_queue::{BatchSummary, UploadQueue};
pub use upload_settings::{original_mode_available, QualityPreferences, UploadSettings};
