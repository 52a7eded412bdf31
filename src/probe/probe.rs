//! Cluster Probe
//!
//! Issues one bounded-timeout operation against a database and folds every
//! possible failure (handle error, timeout) into a `ProbeOutcome`. Nothing
//! escapes this boundary as an error.

use super::handle::DatabaseHandle;
use super::types::{ProbeKind, ProbeOutcome};

use serde_json::json;
use std::time::{Duration, Instant};

/// Key read and updated by the read/update probes. Write probes insert a fresh
/// id every time so a duplicate key is never mistaken for an outage.
pub const PROBE_KEY: &str = "6f0e1c9a-3b7d-4e21-9c55-0d2f8a4b7e10";

#[derive(Debug, Clone)]
pub struct ClusterProbe {
    timeout: Duration,
}

impl ClusterProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn probe(&self, handle: &dyn DatabaseHandle, kind: ProbeKind) -> ProbeOutcome {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, run_operation(handle, kind)).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(Ok(())) => ProbeOutcome::ok(latency_ms),
            Ok(Err(e)) => {
                tracing::debug!("{} {:?} probe failed: {:#}", handle.kind(), kind, e);
                ProbeOutcome::failed(format!("{:#}", e))
            }
            Err(_) => {
                tracing::debug!(
                    "{} {:?} probe timed out after {:?}",
                    handle.kind(),
                    kind,
                    self.timeout
                );
                ProbeOutcome::failed(format!("timed out after {}ms", self.timeout.as_millis()))
            }
        }
    }
}

async fn run_operation(handle: &dyn DatabaseHandle, kind: ProbeKind) -> anyhow::Result<()> {
    match kind {
        ProbeKind::Ping => handle.ping().await,
        ProbeKind::Read => handle.find(json!({ "id": PROBE_KEY })).await.map(|_| ()),
        ProbeKind::Write => handle
            .insert(json!({
                "id": uuid::Uuid::new_v4().to_string(),
                "name": "failure-probe",
                "status": "ACTIVE",
                "type": "probe",
            }))
            .await
            .map(|_| ()),
        ProbeKind::Update => handle
            .update(
                json!({ "id": PROBE_KEY }),
                json!({ "status": "ACTIVE" }),
            )
            .await
            .map(|_| ()),
    }
}
