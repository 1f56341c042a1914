//! reqwest-backed service client

use super::{ClientError, HealthProbe, ServiceClient};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Production client over a shared reqwest connection pool
#[derive(Debug, Clone, Default)]
pub struct HttpServiceClient {
    inner: reqwest::Client,
}

impl HttpServiceClient {
    /// Create a new client
    pub fn new() -> Self {
        Self::default()
    }
}

fn transport_error(url: &str, timeout: Duration, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        ClientError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    async fn post_json(
        &self,
        url: &str,
        body: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<Map<String, Value>, ClientError> {
        debug!("POST {} ({} fields)", url, body.len());

        let response = self
            .inner
            .post(url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidBody {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        match value {
            Value::Object(fields) => Ok(fields),
            other => Err(ClientError::InvalidBody {
                url: url.to_string(),
                message: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }

    async fn probe(&self, url: &str, timeout: Duration) -> Result<HealthProbe, ClientError> {
        let response = self
            .inner
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(url, timeout, e))?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await.ok();

        Ok(HealthProbe { status, body })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
