mod upload_queue_manager;

pub use upload_queue_manager::{UploadEvent, UploadQueueHandle, UploadQueueManager};
