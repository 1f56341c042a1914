//! HTTP access to downstream components

pub mod http;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

pub use http::HttpServiceClient;

/// Error types for downstream calls
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response body from {url}: {message}")]
    InvalidBody { url: String, message: String },
}

/// Raw result of a health probe: whatever status the endpoint returned,
/// plus its body when one could be parsed
#[derive(Debug, Clone)]
pub struct HealthProbe {
    pub status: u16,
    pub body: Option<Value>,
}

/// Trait for calling downstream components - allows for different
/// implementations (production HTTP, test mocks)
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// POST a JSON body to a step endpoint. Any non-2xx status or
    /// transport failure is an error; a 2xx response must carry a JSON
    /// object body, returned as the step's output fields.
    async fn post_json(
        &self,
        url: &str,
        body: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<Map<String, Value>, ClientError>;

    /// GET a health endpoint. Non-2xx statuses are returned, not errors;
    /// only transport failures are.
    async fn probe(&self, url: &str, timeout: Duration) -> Result<HealthProbe, ClientError>;
}
