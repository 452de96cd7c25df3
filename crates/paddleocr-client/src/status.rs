//! Read-only mirrors of the service status payloads.
//!
//! The service wraps these in `{success, timestamp, data: {...}}`; the
//! envelope is removed before decoding, and the outer `timestamp` is kept
//! when the payload has none of its own. Top-level keys are matched
//! case-insensitively.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Response of `GET /api/v1/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Service state, `healthy` when everything is fine.
    pub status: String,
    /// Service-side timestamp, as sent.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Service version.
    #[serde(default)]
    pub version: Option<String>,
    /// Version of the underlying inference framework.
    #[serde(default, alias = "paddleversion")]
    pub paddle_version: Option<String>,
    /// Whether the service can run on a GPU.
    #[serde(default, alias = "gpuavailable")]
    pub gpu_available: Option<bool>,
    /// Seconds since the service started.
    #[serde(default)]
    pub uptime: Option<f64>,
}

impl HealthStatus {
    /// Returns true if the service reports itself as healthy.
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Response of `GET /api/v1/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name.
    pub name: String,
    /// Service version.
    pub version: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Service author.
    #[serde(default)]
    pub author: Option<String>,
    /// Running state, e.g. `running`.
    #[serde(default)]
    pub status: Option<String>,
    /// Language codes the service accepts.
    #[serde(default, alias = "supportedlanguages")]
    pub supported_languages: Vec<String>,
    /// File extensions, with the leading dot.
    #[serde(default, alias = "supportedformats")]
    pub supported_formats: Vec<String>,
    /// Route (`"GET /api/v1/health"`) to description.
    #[serde(default, alias = "apiendpoints")]
    pub api_endpoints: BTreeMap<String, String>,
}

/// Response of `GET /api/v1/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Number of models loaded since start.
    #[serde(default, alias = "modelsloaded")]
    pub models_loaded: u64,
    /// Recognition requests received.
    #[serde(alias = "totalrequests")]
    pub total_requests: u64,
    /// Requests that recognized successfully.
    #[serde(default, alias = "successfulrequests")]
    pub successful_requests: u64,
    /// Requests that failed.
    #[serde(default, alias = "failedrequests")]
    pub failed_requests: u64,
    /// Service start as Unix seconds.
    #[serde(default, alias = "starttime")]
    pub start_time: Option<f64>,
    /// Seconds since the service started.
    #[serde(default)]
    pub uptime: Option<f64>,
    /// Percentage of successful requests, `0..=100`.
    #[serde(default, alias = "successrate")]
    pub success_rate: Option<f64>,
}

impl StatsSnapshot {
    /// Success rate as reported, or computed from the counters.
    pub fn effective_success_rate(&self) -> f64 {
        self.success_rate.unwrap_or_else(|| {
            self.successful_requests as f64 / self.total_requests.max(1) as f64 * 100.0
        })
    }
}

/// Response of `GET /api/v1/models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Keys of the models currently held in memory.
    #[serde(default, alias = "loadedmodels")]
    pub loaded_models: Vec<String>,
    /// Request counters, when the service includes them.
    #[serde(default)]
    pub stats: Option<StatsSnapshot>,
}

/// Decodes a status body, removing the `data` envelope if present.
pub(crate) fn parse_status<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let value: Value = serde_json::from_slice(body)?;
    Ok(serde_json::from_value(unwrap_envelope(value))?)
}

fn unwrap_envelope(value: Value) -> Value {
    let Value::Object(fields) = value else {
        return value;
    };
    let mut fields = lowercase_top_level(fields);

    let payload = match fields.remove("data") {
        Some(Value::Object(inner)) => {
            let mut inner = lowercase_top_level(inner);
            if let Some(timestamp) = fields.remove("timestamp") {
                inner.entry("timestamp").or_insert(timestamp);
            }
            inner
        }
        Some(other) => {
            fields.insert("data".to_owned(), other);
            fields
        }
        None => fields,
    };

    Value::Object(lowercase_stats(payload))
}

/// Lowercases the keys of a nested `stats` object, as carried by `/models`.
fn lowercase_stats(mut payload: Map<String, Value>) -> Map<String, Value> {
    let stats = match payload.remove("stats") {
        Some(Value::Object(stats)) => Value::Object(lowercase_top_level(stats)),
        Some(other) => other,
        None => return payload,
    };
    payload.insert("stats".to_owned(), stats);
    payload
}

/// Lowercases keys of one object level; nested maps such as
/// `api_endpoints` keep their keys as sent.
fn lowercase_top_level(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect()
}
