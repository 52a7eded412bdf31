//! HTTP API contract of the controller.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_SIMULATE: &str = "/api/failure/simulate";
pub const ENDPOINT_STOP: &str = "/api/failure/stop";
pub const ENDPOINT_STATUS: &str = "/api/failure/status";
pub const ENDPOINT_CONTAINER_UPTIMES: &str = "/api/failure/container-uptimes";
pub const ENDPOINT_CAP_ANALYSIS: &str = "/api/cap-analysis";
pub const ENDPOINT_CLUSTER_STATUS: &str = "/api/cluster/status";
pub const ENDPOINT_HEALTH: &str = "/api/health";
pub const ENDPOINT_REPORTS: &str = "/api/report/";
pub const ENDPOINT_LATEST_REPORT: &str = "/api/report/latest";
pub const ENDPOINT_REPORT: &str = "/api/report/:filename";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    pub message: String,
    pub simulation_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub simulation_running: bool,
}
