use crate::cluster::types::DatabaseKind;
use serde::{Deserialize, Serialize};

/// The representative operation a probe issues.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Connectivity only; no data touched.
    Ping,
    Read,
    /// Insert of the fixed probe document.
    Write,
    Update,
}

impl ProbeKind {
    /// Whether an unacknowledged probe of this kind counts as potential data loss.
    pub fn is_write(&self) -> bool {
        matches!(self, ProbeKind::Write | ProbeKind::Update)
    }
}

/// Result of a single probe.
///
/// `latency` is present iff `success`; `error` is present iff not `success`.
/// The constructors are the only way the crate builds one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeOutcome {
    pub success: bool,
    pub latency: Option<f64>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn ok(latency_ms: f64) -> Self {
        Self {
            success: true,
            latency: Some(latency_ms.max(0.0)),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = "unknown error".to_string();
        }
        Self {
            success: false,
            latency: None,
            error: Some(error),
        }
    }
}

/// One probe outcome for one database on one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSample {
    pub timestamp_label: String,
    pub database: DatabaseKind,
    pub kind: ProbeKind,
    pub success: bool,
    pub latency_millis: Option<f64>,
    pub error_message: Option<String>,
}

impl ProbeSample {
    pub fn new(label: &str, database: DatabaseKind, kind: ProbeKind, outcome: &ProbeOutcome) -> Self {
        Self {
            timestamp_label: label.to_string(),
            database,
            kind,
            success: outcome.success,
            latency_millis: outcome.latency,
            error_message: outcome.error.clone(),
        }
    }
}
