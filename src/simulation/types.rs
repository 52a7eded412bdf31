use crate::cluster::types::DatabaseKind;
use crate::probe::types::{ProbeKind, ProbeOutcome, ProbeSample};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The disruption applied to the target member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailureType {
    /// Stop the member's process.
    #[default]
    Node,
    /// Cut the member off from the cluster network.
    Network,
    Disk,
    Memory,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureType::Node => "node",
            FailureType::Network => "network",
            FailureType::Disk => "disk",
            FailureType::Memory => "memory",
        };
        f.write_str(s)
    }
}

/// A simulation request. Immutable once the run starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FailureConfig {
    pub failure_type: FailureType,
    pub target_node: String,
    /// Window length in seconds.
    pub duration: u64,
    /// Issue write probes during the window; when false only connectivity is checked.
    pub test_operations: bool,
    /// Operation probed each tick. Overrides `test_operations` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_operation: Option<ProbeKind>,
}

impl Default for FailureConfig {
    fn default() -> Self {
        Self {
            failure_type: FailureType::Node,
            target_node: "mongo1".to_string(),
            duration: 30,
            test_operations: true,
            probe_operation: None,
        }
    }
}

impl FailureConfig {
    pub fn probe_kind(&self) -> ProbeKind {
        if let Some(kind) = self.probe_operation {
            return kind;
        }
        if self.test_operations {
            ProbeKind::Write
        } else {
            ProbeKind::Ping
        }
    }
}

/// Both databases' outcomes for one sampling tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityPoint {
    pub time: String,
    pub operation: ProbeKind,
    pub mongo: ProbeOutcome,
    pub cassandra: ProbeOutcome,
}

impl AvailabilityPoint {
    pub fn outcome(&self, database: DatabaseKind) -> &ProbeOutcome {
        match database {
            DatabaseKind::Mongo => &self.mongo,
            DatabaseKind::Cassandra => &self.cassandra,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.mongo.success && self.cassandra.success
    }

    pub fn samples(&self) -> [ProbeSample; 2] {
        [
            ProbeSample::new(&self.time, DatabaseKind::Mongo, self.operation, &self.mongo),
            ProbeSample::new(&self.time, DatabaseKind::Cassandra, self.operation, &self.cassandra),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryPoint {
    pub time: String,
    pub mongo_recovery_percent: f64,
    pub cassandra_recovery_percent: f64,
}

/// How the run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Stopped,
    Aborted,
}

/// Reported as the summary's `mode` string. A degraded run means the requested
/// fault was replaced by a node pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationMode {
    pub outcome: RunOutcome,
    pub degraded: bool,
}

pub const DEGRADED_MODE: &str = "degraded-to-node-pause";

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.outcome, self.degraded) {
            (RunOutcome::Aborted, _) => f.write_str("aborted"),
            (RunOutcome::Completed, false) => f.write_str("completed"),
            (RunOutcome::Stopped, false) => f.write_str("stopped"),
            (RunOutcome::Completed, true) => f.write_str(DEGRADED_MODE),
            (RunOutcome::Stopped, true) => write!(f, "{}+stopped", DEGRADED_MODE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSummary {
    pub simulation_id: String,
    pub failure_type: FailureType,
    pub target_node: String,
    pub duration: u64,
    pub mongodb_downtime_seconds: f64,
    pub cassandra_downtime_seconds: f64,
    pub data_loss_mongo: u64,
    pub data_loss_cassandra: u64,
    pub recovery_time_seconds: f64,
    /// Whether both databases were seen healthy after the revert.
    pub recovered: bool,
    pub ticks: usize,
    pub mode: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SimulationSummary {
    pub fn downtime(&self, database: DatabaseKind) -> f64 {
        match database {
            DatabaseKind::Mongo => self.mongodb_downtime_seconds,
            DatabaseKind::Cassandra => self.cassandra_downtime_seconds,
        }
    }
}

/// The full output of one run. Built once at completion and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub summary: SimulationSummary,
    pub availability_metrics: Vec<AvailabilityPoint>,
    pub recovery_metrics: Vec<RecoveryPoint>,
}

/// Whole-simulation state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimulationPhase {
    Idle,
    Injecting,
    Sampling,
    Reverting,
    Recovering,
    Analyzed,
}

impl SimulationPhase {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => SimulationPhase::Injecting,
            2 => SimulationPhase::Sampling,
            3 => SimulationPhase::Reverting,
            4 => SimulationPhase::Recovering,
            5 => SimulationPhase::Analyzed,
            _ => SimulationPhase::Idle,
        }
    }
}
