//! Failure Injector
//!
//! Validates a request against the member registry, takes the simulation lease
//! and applies the requested disruption through the process controller.
//!
//! ## Effects
//! - `node` stops the member.
//! - `network` disconnects the member from the cluster network.
//! - `disk` / `memory` ask the controller for a resource constraint. If the
//!   controller reports the fault as unsupported the member is paused instead and
//!   the handle is marked degraded, which surfaces in the summary's `mode`.
//!
//! `revert` always tries to undo the effect, including after a failed injection,
//! and never fails: errors are logged and the lease is released regardless.

use super::lease::{LeaseSlot, SimulationLease};
use super::types::{FailureConfig, FailureType};
use crate::cluster::process::{ProcessControl, ResourceFault};
use crate::cluster::types::{Member, MemberRegistry};
use crate::error::{ProcessControlError, SimulationError};

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The concrete action taken against the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Stop,
    Partition,
    Constrain(ResourceFault),
    Pause,
}

impl Effect {
    fn describe(&self) -> String {
        match self {
            Effect::Stop => "stop".to_string(),
            Effect::Partition => "network partition".to_string(),
            Effect::Constrain(fault) => format!("{} constraint", fault),
            Effect::Pause => "pause".to_string(),
        }
    }
}

/// An outstanding injection. Holds the lease until `revert` consumes it.
#[derive(Debug)]
pub struct InjectionHandle {
    pub simulation_id: String,
    pub config: FailureConfig,
    pub member: Member,
    pub effect: Effect,
    pub degraded: bool,
    pub injected_at: DateTime<Utc>,
    error: Option<SimulationError>,
    _lease: SimulationLease,
}

impl InjectionHandle {
    /// The injection error, if the effect could not be applied.
    pub fn error(&self) -> Option<&SimulationError> {
        self.error.as_ref()
    }

    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }
}

/// A validated request holding the lease, not yet applied.
#[derive(Debug)]
pub struct PendingInjection {
    pub simulation_id: String,
    pub config: FailureConfig,
    pub member: Member,
    lease: SimulationLease,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertOutcome {
    pub restored: bool,
    pub reverted_at: DateTime<Utc>,
    pub error: Option<String>,
}

pub struct FailureInjector {
    control: Arc<dyn ProcessControl>,
    registry: Arc<MemberRegistry>,
    slot: LeaseSlot,
    max_duration: u64,
}

impl FailureInjector {
    pub fn new(
        control: Arc<dyn ProcessControl>,
        registry: Arc<MemberRegistry>,
        max_duration: u64,
    ) -> Self {
        Self {
            control,
            registry,
            slot: LeaseSlot::new(),
            max_duration,
        }
    }

    pub fn registry(&self) -> &Arc<MemberRegistry> {
        &self.registry
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_held()
    }

    /// Checks the request without side effects.
    pub fn validate(&self, config: &FailureConfig) -> Result<Member, SimulationError> {
        if config.duration == 0 || config.duration > self.max_duration {
            return Err(SimulationError::InvalidDuration {
                got: config.duration,
                max: self.max_duration,
            });
        }

        self.registry
            .get(&config.target_node)
            .ok_or_else(|| SimulationError::UnknownTarget(config.target_node.clone()))
    }

    /// Validates the request and takes the lease. No side effects on the cluster.
    pub fn begin(&self, config: &FailureConfig) -> Result<PendingInjection, SimulationError> {
        let member = self.validate(config)?;
        let lease = self
            .slot
            .try_acquire()
            .ok_or(SimulationError::AlreadyRunning)?;

        Ok(PendingInjection {
            simulation_id: uuid::Uuid::new_v4().to_string(),
            config: config.clone(),
            member,
            lease,
        })
    }

    /// Validates, takes the lease and applies the disruption.
    ///
    /// Returns `Err` only for rejections that happen before any side effect.
    /// A failure while applying the effect yields an aborted handle that must
    /// still be passed to `revert`.
    pub async fn inject(&self, config: &FailureConfig) -> Result<InjectionHandle, SimulationError> {
        let pending = self.begin(config)?;
        Ok(self.apply(pending).await)
    }

    /// Applies the disruption for a leased request.
    pub async fn apply(&self, pending: PendingInjection) -> InjectionHandle {
        let PendingInjection {
            simulation_id,
            config,
            member,
            lease,
        } = pending;

        tracing::info!(
            "Injecting {} failure into {} ({}) [simulation {}]",
            config.failure_type,
            member.name,
            member.database,
            simulation_id
        );

        let (effect, degraded, result) = self.apply_effect(config.failure_type, &member.name).await;

        let error = result.err().map(|source| SimulationError::Injection {
            effect: effect.describe(),
            member: member.name.clone(),
            source,
        });

        if let Some(e) = &error {
            tracing::error!("Injection aborted: {}", e);
        }

        InjectionHandle {
            simulation_id,
            config,
            member,
            effect,
            degraded,
            injected_at: Utc::now(),
            error,
            _lease: lease,
        }
    }

    async fn apply_effect(
        &self,
        failure_type: FailureType,
        member: &str,
    ) -> (Effect, bool, Result<(), ProcessControlError>) {
        match failure_type {
            FailureType::Node => (Effect::Stop, false, self.control.stop(member).await),
            FailureType::Network => (Effect::Partition, false, self.control.partition(member).await),
            FailureType::Disk | FailureType::Memory => {
                let fault = if failure_type == FailureType::Disk {
                    ResourceFault::Disk
                } else {
                    ResourceFault::Memory
                };

                match self.control.constrain(member, fault).await {
                    Ok(()) => (Effect::Constrain(fault), false, Ok(())),
                    Err(ProcessControlError::Unsupported(reason)) => {
                        tracing::warn!(
                            "{} fault unsupported ({}), degrading to node pause on {}",
                            fault,
                            reason,
                            member
                        );
                        (Effect::Pause, true, self.control.pause(member).await)
                    }
                    Err(e) => (Effect::Constrain(fault), false, Err(e)),
                }
            }
        }
    }

    /// Undoes the effect and releases the lease. Never fails.
    pub async fn revert(&self, handle: InjectionHandle) -> RevertOutcome {
        let member = handle.member.name.as_str();
        tracing::info!("Reverting {} on {}", handle.effect.describe(), member);

        let result = match handle.effect {
            Effect::Stop => self.control.start(member).await,
            Effect::Partition => self.control.heal(member).await,
            Effect::Constrain(fault) => self.control.release(member, fault).await,
            Effect::Pause => self.control.unpause(member).await,
        };

        let error = match result {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    "Failed to revert {} on {}: {} (cluster left in best-effort state)",
                    handle.effect.describe(),
                    member,
                    e
                );
                Some(e.to_string())
            }
        };

        // handle (and its lease) dropped here
        RevertOutcome {
            restored: error.is_none(),
            reverted_at: Utc::now(),
            error,
        }
    }
}
