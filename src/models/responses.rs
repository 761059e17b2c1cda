//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::service::ServiceStats;

/// Result of a successful `CacheSrv.Get`
#[derive(Debug, Clone, Serialize)]
pub struct GetReply {
    #[serde(rename = "Value")]
    pub value: String,
}

impl GetReply {
    /// Renders stored bytes as text; invalid UTF-8 is replaced.
    pub fn from_bytes(value: &[u8]) -> Self {
        Self {
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }
}

/// JSON-RPC 1.0 response envelope
///
/// Exactly one of `result` and `error` is non-null.
#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub result: Option<GetReply>,
    pub error: Option<String>,
    pub id: Value,
}

impl RpcResponse {
    pub fn success(id: Value, reply: GetReply) -> Self {
        Self {
            result: Some(reply),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(error.into()),
            id,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: ServiceStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<ServiceStats> for StatsResponse {
    fn from(stats: ServiceStats) -> Self {
        let hit_rate = stats.cache.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
