use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::request::{
    ApiRequest, ApiResponse, FormField, Method, ProgressSink, RequestBody, RequestClient,
    TransferProgress, TransportError,
};
use crate::core::config::ServerConfig;
use crate::core::error::{AppError, Result};
use crate::shared::constants::{CSRF_HEADER_NAME, CSRF_TOKEN_PATH};

/// Response from the CSRF token endpoint
#[derive(Debug, Deserialize)]
struct CsrfTokenResponse {
    csrf_token: String,
}

/// reqwest-backed client for the image host
pub struct HttpRequestClient {
    base_url: String,
    http_client: Client,
    csrf_token: RwLock<Option<String>>,
    /// Size of each streamed body chunk; one progress report per chunk
    chunk_size: usize,
}

impl HttpRequestClient {
    pub fn new(config: &ServerConfig, chunk_size: usize) -> Result<Self> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            csrf_token: RwLock::new(None),
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn csrf_token(&self) -> Option<String> {
        self.csrf_token.read().await.clone()
    }

    /// Fetch a fresh anti-forgery token for the current session.
    ///
    /// The previous token is kept when the fetch fails.
    pub async fn refresh_csrf_token(&self) -> Result<()> {
        let response = self.send(ApiRequest::get(CSRF_TOKEN_PATH), None).await?;
        let token: CsrfTokenResponse = response.into_result("Failed to fetch CSRF token")?;

        debug!("Fetched CSRF token");

        let mut cached = self.csrf_token.write().await;
        *cached = Some(token.csrf_token);

        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn multipart_form(
        &self,
        fields: Vec<FormField>,
        progress: Option<ProgressSink>,
    ) -> std::result::Result<Form, TransportError> {
        let mut form = Form::new();

        for field in fields {
            form = match field {
                FormField::Text { name, value } => form.text(name, value),
                FormField::File { name, file } => {
                    let length = file.size();
                    let body = Body::wrap_stream(progress_stream(
                        Arc::clone(&file.data),
                        self.chunk_size,
                        progress.clone(),
                    ));

                    let mut part = Part::stream_with_length(body, length).file_name(file.name);
                    if let Some(content_type) = file.content_type.as_deref() {
                        part = part.mime_str(content_type).map_err(|e| {
                            TransportError::Request(format!(
                                "Invalid content type '{}': {}",
                                content_type, e
                            ))
                        })?;
                    }
                    form.part(name, part)
                }
            };
        }

        Ok(form)
    }
}

/// Stream `data` in chunks, reporting cumulative bytes as each chunk is taken
/// by the transport.
fn progress_stream(
    data: Arc<[u8]>,
    chunk_size: usize,
    progress: Option<ProgressSink>,
) -> impl Stream<Item = std::result::Result<Vec<u8>, std::io::Error>> + Send + Sync + 'static {
    let total = data.len() as u64;

    stream::unfold(0usize, move |offset| {
        let data = Arc::clone(&data);
        let progress = progress.clone();

        async move {
            if offset >= data.len() {
                return None;
            }

            let end = (offset + chunk_size).min(data.len());
            let chunk = data[offset..end].to_vec();

            if let Some(sink) = progress.as_ref() {
                sink(TransferProgress {
                    sent: end as u64,
                    total,
                });
            }

            Some((Ok(chunk), end))
        }
    })
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl RequestClient for HttpRequestClient {
    async fn send(
        &self,
        request: ApiRequest,
        progress: Option<ProgressSink>,
    ) -> std::result::Result<ApiResponse, TransportError> {
        let url = self.url(&request.path);
        let mut builder = self.http_client.request(request.method.into(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if request.method.is_mutating() {
            if let Some(token) = self.csrf_token.read().await.as_deref() {
                builder = builder.header(CSRF_HEADER_NAME, token);
            }
        }

        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Multipart(fields)) => {
                builder.multipart(self.multipart_form(fields, progress)?)
            }
            None => builder,
        };

        debug!("{} {}", request.method.as_str(), url);

        let response = builder.send().await.map_err(|e| {
            warn!("{} {} failed: {}", request.method.as_str(), url, e);
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        // Error pages are not always JSON; callers fall back to a generic message
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        if status >= 500 {
            warn!("{} {} -> HTTP {}", request.method.as_str(), url, status);
        } else {
            debug!("{} {} -> HTTP {}", request.method.as_str(), url, status);
        }

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_progress_stream_reports_cumulative_bytes() {
        let seen: Arc<Mutex<Vec<TransferProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: ProgressSink =
            Arc::new(move |p: TransferProgress| sink_seen.lock().unwrap().push(p));

        let data: Arc<[u8]> = Arc::from(vec![7u8; 10]);
        let chunks: Vec<_> = progress_stream(data, 4, Some(sink)).collect().await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].as_ref().unwrap().len(), 2);

        let seen = seen.lock().unwrap();
        let sent: Vec<u64> = seen.iter().map(|p| p.sent).collect();
        assert_eq!(sent, vec![4, 8, 10]);
        assert!(seen.last().unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_progress_stream_empty_file() {
        let data: Arc<[u8]> = Arc::from(Vec::new());
        let chunks: Vec<_> = progress_stream(data, 4, None).collect().await;
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let config = ServerConfig {
            base_url: "http://localhost:5000/".to_string(),
            request_timeout: Some(std::time::Duration::from_secs(5)),
        };
        let client = HttpRequestClient::new(&config, 1024).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/api/images"), "http://localhost:5000/api/images");
    }
}
