use crate::error::PerformanceError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

pub const MAX_OPERATION_COUNT: u32 = 10_000;
pub const MAX_BATCH_SIZE: u32 = 1_000;

/// Which operations each batch runs after its inserts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// Insert, read and update.
    #[default]
    Mixed,
    Read,
    /// Inserts only.
    Write,
    Update,
}

impl TestType {
    pub fn reads(&self) -> bool {
        matches!(self, TestType::Mixed | TestType::Read)
    }

    pub fn updates(&self) -> bool {
        matches!(self, TestType::Mixed | TestType::Update)
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestType::Mixed => "mixed",
            TestType::Read => "read",
            TestType::Write => "write",
            TestType::Update => "update",
        };
        f.write_str(s)
    }
}

/// Recorded with the run. The data services pick their own consistency, so this
/// labels the result rather than changing how requests are sent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyLevel {
    #[default]
    Eventual,
    Strong,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceTestConfig {
    pub operation_count: u32,
    pub batch_size: u32,
    pub consistency_level: ConsistencyLevel,
    pub test_type: TestType,
}

impl Default for PerformanceTestConfig {
    fn default() -> Self {
        Self {
            operation_count: 1000,
            batch_size: 100,
            consistency_level: ConsistencyLevel::Eventual,
            test_type: TestType::Mixed,
        }
    }
}

impl PerformanceTestConfig {
    pub fn validate(&self) -> Result<(), PerformanceError> {
        if !(1..=MAX_OPERATION_COUNT).contains(&self.operation_count) {
            return Err(PerformanceError::InvalidConfig(format!(
                "operationCount must be between 1 and {}, got {}",
                MAX_OPERATION_COUNT, self.operation_count
            )));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(PerformanceError::InvalidConfig(format!(
                "batchSize must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        Ok(())
    }
}

const STATUSES: [&str; 3] = ["ACTIVE", "INACTIVE", "MAINTENANCE"];
const DEVICE_TYPES: [&str; 3] = ["sensor", "actuator", "controller"];

/// One generated workload document.
#[derive(Debug, Clone, PartialEq)]
pub struct TestDocument {
    pub id: String,
    pub name: String,
    pub status: &'static str,
    pub device_type: &'static str,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl TestDocument {
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "status": self.status,
            "type": self.device_type,
            "value": self.value,
            "timestamp": self.timestamp.to_rfc3339(),
        })
    }
}

/// Builds `count` documents. Status cycles every document and type every three,
/// so a third of the workload matches the `ACTIVE` read filter.
pub fn generate_test_data(count: u32, timestamp: DateTime<Utc>) -> Vec<TestDocument> {
    (0..count as usize)
        .map(|i| TestDocument {
            id: uuid::Uuid::new_v4().to_string(),
            name: format!("Device {}", i),
            status: STATUSES[i % STATUSES.len()],
            device_type: DEVICE_TYPES[(i / STATUSES.len()) % DEVICE_TYPES.len()],
            value: ((i * 37) % 1000) as f64 / 10.0,
            timestamp,
        })
        .collect()
}

/// Batch latencies in milliseconds, one entry per batch that ran the operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OperationLatencies {
    pub insert: Vec<f64>,
    pub read: Vec<f64>,
    pub update: Vec<f64>,
}

/// What one database did during a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseRunResult {
    pub latencies: OperationLatencies,
    /// Batches that failed part-way. The rest of a failed batch is skipped.
    pub errors: u64,
    pub total_operations: u32,
    /// Operations per second over the whole run.
    pub throughput: f64,
    pub total_time_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatencyMetric {
    pub operation: String,
    pub mongodb: f64,
    pub cassandra: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThroughputMetric {
    pub db: String,
    pub throughput: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub run_id: String,
    pub total_ops: u32,
    pub errors: u64,
    pub batch_size: u32,
    pub test_type: TestType,
    pub consistency_level: ConsistencyLevel,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailedResults {
    pub mongo: DatabaseRunResult,
    pub cassandra: DatabaseRunResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTestResult {
    pub summary: PerformanceSummary,
    pub latency_metrics: Vec<LatencyMetric>,
    pub throughput_metrics: Vec<ThroughputMetric>,
    pub detailed_results: DetailedResults,
}
