//! HTTP transport for the image host
//!
//! `RequestClient` is the seam the upload queue and gallery loader talk to;
//! `HttpRequestClient` is the reqwest-backed implementation with a session
//! cookie jar, CSRF header injection and streamed multipart bodies.

mod client;
mod request;

pub use client::HttpRequestClient;
pub use request::{
    ApiRequest, ApiResponse, FormField, Method, ProgressSink, RequestBody, RequestClient,
    TransferProgress, TransportError,
};
