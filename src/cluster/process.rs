//! Process Control
//!
//! The seam between the injector and whatever actually runs the database
//! members. The production implementation shells out to the docker CLI; tests
//! substitute a recording fake.

use super::types::MemberUptime;
use crate::error::ProcessControlError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::process::Command;

/// Resource faults finer-grained than stopping a member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFault {
    Disk,
    Memory,
}

impl fmt::Display for ResourceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceFault::Disk => f.write_str("disk"),
            ResourceFault::Memory => f.write_str("memory"),
        }
    }
}

#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// Stops the member's process.
    async fn stop(&self, member: &str) -> Result<(), ProcessControlError>;

    async fn start(&self, member: &str) -> Result<(), ProcessControlError>;

    /// Freezes the member without tearing it down.
    async fn pause(&self, member: &str) -> Result<(), ProcessControlError>;

    async fn unpause(&self, member: &str) -> Result<(), ProcessControlError>;

    /// Cuts the member off from cluster-internal traffic; the process keeps running.
    async fn partition(&self, member: &str) -> Result<(), ProcessControlError>;

    async fn heal(&self, member: &str) -> Result<(), ProcessControlError>;

    /// Applies a resource constraint. Returns `Unsupported` when the controller
    /// cannot express the fault.
    async fn constrain(&self, member: &str, fault: ResourceFault) -> Result<(), ProcessControlError>;

    async fn release(&self, member: &str, fault: ResourceFault) -> Result<(), ProcessControlError>;

    async fn uptime(&self, member: &str) -> Result<MemberUptime, ProcessControlError>;
}

/// Drives containers through the `docker` command-line client.
pub struct DockerProcessControl {
    docker_bin: String,
    network: String,
}

impl DockerProcessControl {
    pub fn new(docker_bin: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            docker_bin: docker_bin.into(),
            network: network.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, ProcessControlError> {
        let command = format!("{} {}", self.docker_bin, args.join(" "));
        tracing::debug!("Running `{}`", command);

        let output = Command::new(&self.docker_bin).args(args).output().await?;

        if !output.status.success() {
            return Err(ProcessControlError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl ProcessControl for DockerProcessControl {
    async fn stop(&self, member: &str) -> Result<(), ProcessControlError> {
        self.run(&["stop", member]).await.map(|_| ())
    }

    async fn start(&self, member: &str) -> Result<(), ProcessControlError> {
        self.run(&["start", member]).await.map(|_| ())
    }

    async fn pause(&self, member: &str) -> Result<(), ProcessControlError> {
        self.run(&["pause", member]).await.map(|_| ())
    }

    async fn unpause(&self, member: &str) -> Result<(), ProcessControlError> {
        self.run(&["unpause", member]).await.map(|_| ())
    }

    async fn partition(&self, member: &str) -> Result<(), ProcessControlError> {
        self.run(&["network", "disconnect", &self.network, member])
            .await
            .map(|_| ())
    }

    async fn heal(&self, member: &str) -> Result<(), ProcessControlError> {
        self.run(&["network", "connect", &self.network, member])
            .await
            .map(|_| ())
    }

    async fn constrain(&self, member: &str, fault: ResourceFault) -> Result<(), ProcessControlError> {
        // The docker CLI has no reversible disk or memory pressure primitive.
        Err(ProcessControlError::Unsupported(format!(
            "{} fault on {}",
            fault, member
        )))
    }

    async fn release(&self, _member: &str, _fault: ResourceFault) -> Result<(), ProcessControlError> {
        Ok(())
    }

    async fn uptime(&self, member: &str) -> Result<MemberUptime, ProcessControlError> {
        let out = self
            .run(&[
                "inspect",
                "--format",
                "{{.State.StartedAt}}|{{.State.Status}}",
                member,
            ])
            .await?;
        parse_inspect_output(&out, Utc::now())
    }
}

/// Parses `<StartedAt>|<Status>` as printed by `docker inspect`.
pub fn parse_inspect_output(
    output: &str,
    now: DateTime<Utc>,
) -> Result<MemberUptime, ProcessControlError> {
    let (started_at, status) = output
        .split_once('|')
        .ok_or_else(|| ProcessControlError::Parse(output.to_string()))?;
    let status = status.trim().to_string();

    if started_at.trim().is_empty() {
        return Ok(MemberUptime::Known {
            seconds: 0,
            hours: 0.0,
            status,
        });
    }

    let started = DateTime::parse_from_rfc3339(started_at.trim())
        .map_err(|e| ProcessControlError::Parse(format!("{}: {}", started_at, e)))?
        .with_timezone(&Utc);

    let seconds = (now - started).num_seconds().max(0) as u64;
    let hours = (seconds as f64 / 3600.0 * 100.0).round() / 100.0;

    Ok(MemberUptime::Known {
        seconds,
        hours,
        status,
    })
}
