use super::upload_item::{UploadId, UploadItem, UploadStatus};
use super::upload_settings::UploadSettings;
use crate::modules::http::TransferProgress;
use crate::modules::notify::Severity;
use crate::shared::types::UploadFile;

/// Terminal outcome of a drained batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub done: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// The one notification emitted for a drained batch
    pub fn notification(&self) -> (String, Severity) {
        if self.done > 0 {
            let mut message = format!("Upload complete: {} succeeded", self.done);
            if self.failed > 0 {
                message.push_str(&format!(", {} failed", self.failed));
            }
            (message, Severity::Success)
        } else {
            (
                format!("Upload failed: {} file(s)", self.failed),
                Severity::Error,
            )
        }
    }
}

/// Ordered upload queue with single-slot admission.
///
/// Pure state: the worker owns one and drives it from network callbacks.
#[derive(Debug, Default)]
pub struct UploadQueue {
    items: Vec<UploadItem>,
    active: Option<UploadId>,
    /// Bumped on every clear; pending clear timers carry the epoch they were
    /// scheduled in
    epoch: u64,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn get(&self, id: UploadId) -> Option<&UploadItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn get_mut(&mut self, id: UploadId) -> Option<&mut UploadItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// An upload is in flight
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// No item is Pending or Uploading
    pub fn is_drained(&self) -> bool {
        self.items.iter().all(|item| item.status.is_terminal())
    }

    /// Append one Pending item per file, in order
    pub fn enqueue(&mut self, files: Vec<UploadFile>, settings: UploadSettings) -> Vec<UploadId> {
        files
            .into_iter()
            .map(|file| {
                let item = UploadItem::new(file, settings);
                let id = item.id;
                self.items.push(item);
                id
            })
            .collect()
    }

    /// Admit the oldest Pending item, unless one is already in flight
    pub fn start_next(&mut self) -> Option<&UploadItem> {
        if self.is_busy() {
            return None;
        }

        let index = self
            .items
            .iter()
            .position(|item| item.status == UploadStatus::Pending)?;

        let item = &mut self.items[index];
        item.transition(UploadStatus::Uploading);
        self.active = Some(item.id);

        Some(&self.items[index])
    }

    /// Record transfer progress for the active item.
    ///
    /// Returns the new percentage when it moved forward.
    pub fn record_progress(&mut self, id: UploadId, progress: TransferProgress) -> Option<u8> {
        if self.active != Some(id) {
            return None;
        }

        let item = self.get_mut(id)?;
        let percent = progress.percent();
        if percent <= item.progress {
            return None;
        }

        item.progress = percent;
        Some(percent)
    }

    /// Flag the active item as fully handed to the transport.
    ///
    /// Returns false if it already was.
    pub fn mark_transferred(&mut self, id: UploadId) -> bool {
        if self.active != Some(id) {
            return false;
        }

        match self.get_mut(id) {
            Some(item) if !item.transferred => {
                item.progress = 100;
                item.transferred = true;
                true
            }
            _ => false,
        }
    }

    pub fn complete(&mut self, id: UploadId) -> bool {
        self.finish(id, UploadStatus::Done, None)
    }

    pub fn fail(&mut self, id: UploadId, message: String) -> bool {
        self.finish(id, UploadStatus::Error, Some(message))
    }

    fn finish(&mut self, id: UploadId, status: UploadStatus, error: Option<String>) -> bool {
        if self.active != Some(id) {
            return false;
        }
        self.active = None;

        let Some(item) = self.get_mut(id) else {
            return false;
        };
        if !item.transition(status) {
            return false;
        }
        item.error = error;
        true
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            done: self
                .items
                .iter()
                .filter(|item| item.status == UploadStatus::Done)
                .count(),
            failed: self
                .items
                .iter()
                .filter(|item| item.status == UploadStatus::Error)
                .count(),
        }
    }

    /// Drop every item of a drained batch.
    ///
    /// Returns false, leaving the queue untouched, while work remains.
    pub fn clear(&mut self) -> bool {
        if !self.is_drained() {
            return false;
        }
        self.items.clear();
        self.epoch += 1;
        true
    }
}
