pub mod models;
pub mod services;
pub mod workers;

pub use models::{QualityPreferences, UploadSettings, UploadStatus};
pub use services::QualityService;
pub use workers::{UploadEvent, UploadQueueHandle, UploadQueueManager};
