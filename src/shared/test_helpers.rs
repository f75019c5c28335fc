//! Scriptable collaborators for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use crate::modules::http::{
    ApiRequest, ApiResponse, ProgressSink, RequestClient, TransferProgress, TransportError,
};
use crate::modules::notify::{Notifier, Severity};
use crate::shared::types::Image;

/// A request the fake client is holding until the test answers it
pub struct PendingCall {
    pub request: ApiRequest,
    progress: Option<ProgressSink>,
    responder: oneshot::Sender<Result<ApiResponse, TransportError>>,
}

impl PendingCall {
    pub fn report_progress(&self, sent: u64, total: u64) {
        if let Some(sink) = self.progress.as_ref() {
            sink(TransferProgress { sent, total });
        }
    }

    pub fn respond(self, status: u16, body: Value) {
        let _ = self.responder.send(Ok(ApiResponse::new(status, body)));
    }

    pub fn fail(self, message: &str) {
        let _ = self
            .responder
            .send(Err(TransportError::Request(message.to_string())));
    }

    /// Value of a multipart text field
    pub fn form_text(&self, field: &str) -> Option<String> {
        use crate::modules::http::{FormField, RequestBody};

        match self.request.body.as_ref()? {
            RequestBody::Multipart(fields) => fields.iter().find_map(|f| match f {
                FormField::Text { name, value } if name == field => Some(value.clone()),
                _ => None,
            }),
            RequestBody::Json(_) => None,
        }
    }

    /// Name of the uploaded file in a multipart body
    pub fn file_name(&self) -> Option<String> {
        use crate::modules::http::{FormField, RequestBody};

        match self.request.body.as_ref()? {
            RequestBody::Multipart(fields) => fields.iter().find_map(|f| match f {
                FormField::File { file, .. } => Some(file.name.clone()),
                _ => None,
            }),
            RequestBody::Json(_) => None,
        }
    }
}

/// RequestClient whose calls block until the test responds to them
pub struct FakeRequestClient {
    calls_tx: mpsc::UnboundedSender<PendingCall>,
    calls_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<PendingCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRequestClient {
    pub fn new() -> Arc<Self> {
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            calls_tx,
            calls_rx: tokio::sync::Mutex::new(calls_rx),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Wait for the next request the code under test sends
    pub async fn next_call(&self) -> PendingCall {
        let mut rx = self.calls_rx.lock().await;
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a request")
            .expect("fake client channel closed")
    }

    /// A request that is already waiting, if any
    pub async fn try_next_call(&self) -> Option<PendingCall> {
        let mut rx = self.calls_rx.lock().await;
        rx.try_recv().ok()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestClient for FakeRequestClient {
    async fn send(
        &self,
        request: ApiRequest,
        progress: Option<ProgressSink>,
    ) -> Result<ApiResponse, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (responder, response) = oneshot::channel();
        let _ = self.calls_tx.send(PendingCall {
            request,
            progress,
            responder,
        });

        let result = response
            .await
            .unwrap_or_else(|_| Err(TransportError::Request("call dropped".to_string())));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Notifier that remembers every message
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<VecDeque<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().unwrap().iter().cloned().collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap()
            .push_back((message.to_string(), severity));
    }
}

pub fn image_json(id: i64, original_name: &str) -> Value {
    json!({
        "id": id,
        "filename": format!("{:08x}.webp", id),
        "original_name": original_name,
        "size": 1024 * id,
        "width": 800,
        "height": 600,
        "mime_type": "image/webp",
        "upload_time": "2024-05-01T10:20:30",
        "views": 0
    })
}

pub fn image(id: i64, original_name: &str) -> Image {
    serde_json::from_value(image_json(id, original_name)).unwrap()
}

pub fn page_json(page: u32, pages: u32, images: &[Value]) -> Value {
    json!({
        "images": images,
        "total": images.len(),
        "pages": pages,
        "current_page": page
    })
}
