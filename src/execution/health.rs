//! Point-in-time component health probes
//!
//! A probe is a read-only snapshot for dashboards; it does not touch the
//! circuit breaker or the execution history.

use crate::client::ServiceClient;
use crate::core::config::ComponentConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Health of one component at probe time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComponentHealth {
    /// Health endpoint answered 200
    Healthy {
        response_time_ms: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },

    /// Health endpoint answered with a non-200 status
    Unhealthy { http_status: u16 },

    /// The component could not be reached at all
    Unreachable { error: String },

    /// The component is disabled in configuration; no call was made
    Disabled,
}

impl ComponentHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ComponentHealth::Healthy { .. })
    }
}

/// Probe every configured component's health endpoint
pub async fn probe_components<C: ServiceClient>(
    client: &C,
    components: &HashMap<String, ComponentConfig>,
) -> HashMap<String, ComponentHealth> {
    let mut health = HashMap::new();

    for (name, component) in components {
        if !component.enabled {
            health.insert(name.clone(), ComponentHealth::Disabled);
            continue;
        }

        let url = format!("{}{}", component.base_url, component.health_endpoint);
        let started = Instant::now();
        let outcome = client.probe(&url, PROBE_TIMEOUT).await;
        let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let status = match outcome {
            Ok(probe) if probe.status == 200 => ComponentHealth::Healthy {
                response_time_ms,
                details: probe.body,
            },
            Ok(probe) => ComponentHealth::Unhealthy {
                http_status: probe.status,
            },
            Err(e) => ComponentHealth::Unreachable {
                error: e.to_string(),
            },
        };

        debug!("health probe for {}: {:?}", name, status);
        health.insert(name.clone(), status);
    }

    health
}
