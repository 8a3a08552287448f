//! Response DTOs for the diagnostic endpoints
//!
//! Defines the JSON bodies served under `/__offline/`.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::controller::{FetchStats, Phase};

/// Response body for the health endpoint (GET /__offline/health)
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

/// Response body for the status endpoint (GET /__offline/status)
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Current lifecycle phase
    pub phase: Phase,
    /// Name of the current cache store
    pub cache_name: String,
    /// Whether requests are being intercepted
    pub clients_claimed: bool,
    pub skip_waiting: bool,
    /// Statistics of the current store, absent before the first install
    pub cache: Option<CacheStats>,
    /// Hit rate of the current store (hits / (hits + misses))
    pub hit_rate: f64,
    pub fetch: FetchStats,
}

impl StatusResponse {
    pub fn new(
        phase: Phase,
        cache_name: impl Into<String>,
        clients_claimed: bool,
        skip_waiting: bool,
        cache: Option<CacheStats>,
        fetch: FetchStats,
    ) -> Self {
        let hit_rate = cache.as_ref().map(CacheStats::hit_rate).unwrap_or(0.0);
        Self {
            phase,
            cache_name: cache_name.into(),
            clients_claimed,
            skip_waiting,
            cache,
            hit_rate,
            fetch,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
