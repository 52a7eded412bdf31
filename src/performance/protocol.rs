//! HTTP API contract of the performance endpoints.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_PERFORMANCE_RUN: &str = "/api/performance/run";
pub const ENDPOINT_PERFORMANCE_CLEANUP: &str = "/api/performance/cleanup";
pub const ENDPOINT_TEST_LATENCY: &str = "/api/performance/test-latency";
pub const ENDPOINT_REQUEST_STATS: &str = "/api/performance/stats";

#[derive(Debug, Deserialize)]
pub struct DatabaseParams {
    pub db: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyResponse {
    pub db: String,
    /// Milliseconds.
    pub latency: f64,
    pub status: String,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatsResponse {
    pub db: String,
    pub throughput: u64,
    pub avg_latency_ms: f64,
}
