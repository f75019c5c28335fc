use uuid::Uuid;

use super::upload_settings::UploadSettings;
use crate::shared::types::UploadFile;

pub type UploadId = Uuid;

/// Lifecycle of a queued upload. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    Pending,
    Uploading,
    Done,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Done | UploadStatus::Error)
    }

    pub fn can_transition_to(self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (UploadStatus::Pending, UploadStatus::Uploading)
                | (UploadStatus::Uploading, UploadStatus::Done)
                | (UploadStatus::Uploading, UploadStatus::Error)
        )
    }
}

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub id: UploadId,
    pub file: UploadFile,
    /// Resolved once at enqueue time
    pub settings: UploadSettings,
    pub status: UploadStatus,
    /// Transfer percentage, 0-100
    pub progress: u8,
    /// Every body byte has been handed to the transport
    pub transferred: bool,
    pub error: Option<String>,
}

impl UploadItem {
    pub fn new(file: UploadFile, settings: UploadSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            settings,
            status: UploadStatus::Pending,
            progress: 0,
            transferred: false,
            error: None,
        }
    }

    /// Move to `next`, refusing anything but a forward step
    pub(crate) fn transition(&mut self, next: UploadStatus) -> bool {
        if !self.status.can_transition_to(next) {
            tracing::warn!(
                "Ignoring upload {} transition {:?} -> {:?}",
                self.id,
                self.status,
                next
            );
            return false;
        }
        self.status = next;
        true
    }

    /// Label for a progress row
    pub fn status_label(&self) -> String {
        match self.status {
            UploadStatus::Pending => "Waiting".to_string(),
            UploadStatus::Uploading if self.transferred => "Server processing...".to_string(),
            UploadStatus::Uploading if self.progress == 0 => "Preparing upload...".to_string(),
            UploadStatus::Uploading => format!("Uploading {}%", self.progress),
            UploadStatus::Done => "Done".to_string(),
            UploadStatus::Error => self.error.clone().unwrap_or_else(|| "Failed".to_string()),
        }
    }
}
