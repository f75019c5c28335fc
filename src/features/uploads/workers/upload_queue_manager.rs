use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::core::error::{AppError, Result};
use crate::features::gallery::GalleryLoader;
use crate::features::uploads::models::{
    BatchSummary, UploadId, UploadItem, UploadQueue, UploadSettings,
};
use crate::modules::http::{
    ApiRequest, FormField, ProgressSink, RequestClient, TransferProgress,
};
use crate::modules::notify::Notifier;
use crate::shared::constants::{NETWORK_ERROR_MESSAGE, UNKNOWN_ERROR_MESSAGE, UPLOAD_PATH};
use crate::shared::types::{Image, UploadFile};

/// Message shown when a 2xx upload response cannot be decoded
const INVALID_RESPONSE_MESSAGE: &str = "Invalid server response";

/// Observable queue transitions, in the order they happen
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Queued { id: UploadId, name: String, size: u64 },
    Started { id: UploadId },
    /// Transfer percentage moved forward
    Progress { id: UploadId, percent: u8 },
    /// Body fully sent; the server is still processing
    Transferred { id: UploadId },
    Completed { id: UploadId, image: Image },
    Failed { id: UploadId, message: String },
    /// A batch of exactly one file succeeded
    ShowDetail(Image),
    BatchFinished(BatchSummary),
    /// The drained batch was removed after its grace window
    Cleared,
}

enum Command {
    Enqueue {
        files: Vec<UploadFile>,
        settings: UploadSettings,
    },
    Snapshot(oneshot::Sender<Vec<UploadItem>>),
}

/// How the server answered an upload
enum UploadOutcome {
    Created(Image),
    /// The server answered with an error
    Rejected(String),
    /// No response at all
    Lost(String),
}

/// Messages from tasks the worker spawned
enum Internal {
    Progress {
        id: UploadId,
        progress: TransferProgress,
    },
    Finished {
        id: UploadId,
        outcome: UploadOutcome,
    },
    ClearBatch {
        epoch: u64,
    },
}

/// Cheap handle for feeding the upload worker
#[derive(Clone)]
pub struct UploadQueueHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl UploadQueueHandle {
    /// Append files to the queue; an empty list is a no-op
    pub fn enqueue(&self, files: Vec<UploadFile>, settings: UploadSettings) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        self.commands
            .send(Command::Enqueue { files, settings })
            .map_err(|_| AppError::Internal("Upload worker has stopped".to_string()))
    }

    /// Current queue contents
    pub async fn snapshot(&self) -> Result<Vec<UploadItem>> {
        let (reply, items) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(reply))
            .map_err(|_| AppError::Internal("Upload worker has stopped".to_string()))?;

        items
            .await
            .map_err(|_| AppError::Internal("Upload worker dropped the request".to_string()))
    }
}

/// Upload worker: owns the queue and admits one upload at a time.
///
/// Runs until every handle is dropped and the current batch has drained.
pub struct UploadQueueManager {
    client: Arc<dyn RequestClient>,
    notifier: Arc<dyn Notifier>,
    gallery: GalleryLoader,
    grace_window: Duration,
    queue: UploadQueue,
    commands: mpsc::UnboundedReceiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    events: mpsc::UnboundedSender<UploadEvent>,
}

impl UploadQueueManager {
    pub fn new(
        client: Arc<dyn RequestClient>,
        notifier: Arc<dyn Notifier>,
        gallery: GalleryLoader,
        grace_window: Duration,
    ) -> (Self, UploadQueueHandle, mpsc::UnboundedReceiver<UploadEvent>) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();

        let manager = Self {
            client,
            notifier,
            gallery,
            grace_window,
            queue: UploadQueue::new(),
            commands,
            internal_tx,
            internal_rx,
            events,
        };

        (
            manager,
            UploadQueueHandle {
                commands: commands_tx,
            },
            events_rx,
        )
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        tracing::info!("Starting upload worker");

        let mut detached = false;
        loop {
            tokio::select! {
                command = self.commands.recv(), if !detached => match command {
                    Some(command) => self.handle_command(command),
                    None => detached = true,
                },
                Some(message) = self.internal_rx.recv() => self.handle_internal(message),
                else => break,
            }

            if detached && self.queue.is_drained() {
                break;
            }
        }

        tracing::info!("Upload worker stopped");
    }

    fn emit(&self, event: UploadEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Enqueue { files, settings } => self.enqueue(files, settings),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.queue.items().to_vec());
            }
        }
    }

    fn handle_internal(&mut self, message: Internal) {
        match message {
            Internal::Progress { id, progress } => {
                if let Some(percent) = self.queue.record_progress(id, progress) {
                    self.emit(UploadEvent::Progress { id, percent });
                }
                if progress.is_complete() && self.queue.mark_transferred(id) {
                    self.emit(UploadEvent::Transferred { id });
                }
            }
            Internal::Finished { id, outcome } => self.finish(id, outcome),
            Internal::ClearBatch { epoch } => {
                if epoch == self.queue.epoch() {
                    self.clear_batch();
                }
            }
        }
    }

    fn enqueue(&mut self, files: Vec<UploadFile>, settings: UploadSettings) {
        if files.is_empty() {
            return;
        }

        // A drained batch still in its grace window gives way to the new one
        if !self.queue.is_empty() && self.queue.is_drained() {
            self.clear_batch();
        }

        let count = files.len();
        for id in self.queue.enqueue(files, settings) {
            if let Some(item) = self.queue.get(id) {
                self.emit(UploadEvent::Queued {
                    id,
                    name: item.file.name.clone(),
                    size: item.file.size(),
                });
            }
        }

        tracing::info!(
            "Queued {} file(s) for upload (quality {}, passthrough {})",
            count,
            settings.quality,
            settings.passthrough
        );

        self.process_next();
    }

    /// Admit the oldest pending item unless an upload is in flight
    fn process_next(&mut self) {
        let Some(item) = self.queue.start_next() else {
            return;
        };

        let id = item.id;
        let request = upload_request(item);
        tracing::info!(
            "Uploading {} ({} bytes, quality {})",
            item.file.name,
            item.file.size(),
            item.settings.quality
        );

        self.emit(UploadEvent::Started { id });
        self.dispatch(id, request);
    }

    fn dispatch(&self, id: UploadId, request: ApiRequest) {
        let client = Arc::clone(&self.client);
        let internal = self.internal_tx.clone();

        let progress_tx = self.internal_tx.clone();
        let sink: ProgressSink = Arc::new(move |progress: TransferProgress| {
            let _ = progress_tx.send(Internal::Progress { id, progress });
        });

        tokio::spawn(async move {
            let outcome = match client.send(request, Some(sink)).await {
                Ok(response) if response.is_success() => match response.json::<Image>() {
                    Ok(image) => UploadOutcome::Created(image),
                    Err(e) => {
                        tracing::warn!("Upload {} returned an unreadable body: {}", id, e);
                        UploadOutcome::Rejected(INVALID_RESPONSE_MESSAGE.to_string())
                    }
                },
                Ok(response) => {
                    tracing::warn!("Upload {} rejected: HTTP {}", id, response.status);
                    UploadOutcome::Rejected(response.error_message_or(UNKNOWN_ERROR_MESSAGE))
                }
                Err(e) => {
                    tracing::warn!("Upload {} failed: {}", id, e);
                    UploadOutcome::Lost(NETWORK_ERROR_MESSAGE.to_string())
                }
            };

            let _ = internal.send(Internal::Finished { id, outcome });
        });
    }

    fn finish(&mut self, id: UploadId, outcome: UploadOutcome) {
        // Only a stored image proves the whole body arrived; a rejection may
        // come before the server read it
        if matches!(outcome, UploadOutcome::Created(_)) {
            if let Some(percent) = self
                .queue
                .record_progress(id, TransferProgress { sent: 1, total: 1 })
            {
                self.emit(UploadEvent::Progress { id, percent });
            }
            if self.queue.mark_transferred(id) {
                self.emit(UploadEvent::Transferred { id });
            }
        }

        let finished = match outcome {
            UploadOutcome::Created(image) => {
                let finished = self.queue.complete(id);
                if finished {
                    tracing::info!("Upload {} stored as {}", id, image.filename);
                    let single = self.queue.len() == 1;
                    self.emit(UploadEvent::Completed {
                        id,
                        image: image.clone(),
                    });
                    if single {
                        self.emit(UploadEvent::ShowDetail(image));
                    }
                }
                finished
            }
            UploadOutcome::Rejected(message) | UploadOutcome::Lost(message) => {
                let finished = self.queue.fail(id, message.clone());
                if finished {
                    self.emit(UploadEvent::Failed { id, message });
                }
                finished
            }
        };

        if !finished {
            return;
        }

        self.process_next();
        if self.queue.is_drained() {
            self.on_drained();
        }
    }

    fn on_drained(&mut self) {
        let summary = self.queue.summary();
        tracing::info!(
            "Upload batch finished: {} succeeded, {} failed",
            summary.done,
            summary.failed
        );

        let (message, severity) = summary.notification();
        self.notifier.notify(&message, severity);
        self.emit(UploadEvent::BatchFinished(summary));

        drop(self.gallery.reload());

        let epoch = self.queue.epoch();
        let internal = self.internal_tx.clone();
        let grace_window = self.grace_window;
        tokio::spawn(async move {
            tokio::time::sleep(grace_window).await;
            let _ = internal.send(Internal::ClearBatch { epoch });
        });
    }

    fn clear_batch(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        if self.queue.clear() {
            tracing::debug!("Upload queue cleared");
            self.emit(UploadEvent::Cleared);
        }
    }
}

fn upload_request(item: &UploadItem) -> ApiRequest {
    let mut fields = vec![
        FormField::file("file", item.file.clone()),
        FormField::text("quality", item.settings.quality.to_string()),
    ];
    if item.settings.passthrough {
        fields.push(FormField::text("passthrough", "true"));
    }

    ApiRequest::post(UPLOAD_PATH).multipart(fields)
}
