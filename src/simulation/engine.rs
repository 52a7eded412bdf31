//! Simulation Engine
//!
//! Drives one run through `Idle -> Injecting -> Sampling -> Reverting ->
//! Recovering -> Analyzed -> Idle`.
//!
//! - A stop request moves `Sampling` straight to `Reverting` and skips the
//!   recovery window. A stop that lands while reverting or recovering ends the
//!   recovery window early; either way the run reports `mode = "stopped"`.
//! - A failed injection moves `Injecting -> Reverting -> Idle` and reports
//!   `mode = "aborted"`.
//! - Runs are serialized by a run lease held for the whole run, on top of the
//!   injector's disruption lease. Both are guards, so a panicking or cancelled
//!   run still returns the engine to `Idle`.

use super::analyzer::{RunRecord, analyze, recovery_curve};
use super::injector::FailureInjector;
use super::lease::{LeaseSlot, SimulationLease};
use super::sampler::{AvailabilitySampler, StopSignal};
use super::types::{
    FailureConfig, RunOutcome, SimulationMode, SimulationPhase, SimulationResult,
};
use crate::cap::classifier::classify;
use crate::cap::types::{CapAnalysis, Topology};
use crate::error::SimulationError;
use crate::reports::store::{ReportStore, persist_simulation};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Snapshot of the engine for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStatus {
    pub running: bool,
    pub phase: SimulationPhase,
    pub tick: usize,
    pub simulation_id: Option<String>,
}

/// A finished run together with the static CAP table it was reported alongside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    #[serde(flatten)]
    pub result: SimulationResult,
    pub cap_analysis: CapAnalysis,
}

struct ActiveRun {
    simulation_id: String,
    stop: Arc<StopSignal>,
}

pub struct SimulationEngine {
    injector: FailureInjector,
    sampler: AvailabilitySampler,
    topology: Topology,
    recovery_ticks: usize,
    run_slot: LeaseSlot,
    phase: AtomicU8,
    tick: AtomicUsize,
    active: Mutex<Option<ActiveRun>>,
    reports: Option<Arc<dyn ReportStore>>,
}

/// Resets the engine's observable state when a run ends, however it ends.
struct RunGuard<'a> {
    engine: &'a SimulationEngine,
    _lease: SimulationLease,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.engine.set_phase(SimulationPhase::Idle);
        self.engine.tick.store(0, Ordering::SeqCst);
        if let Ok(mut active) = self.engine.active.lock() {
            *active = None;
        }
    }
}

impl SimulationEngine {
    pub fn new(
        injector: FailureInjector,
        sampler: AvailabilitySampler,
        topology: Topology,
        recovery_ticks: usize,
    ) -> Arc<Self> {
        Arc::new(Self::build(injector, sampler, topology, recovery_ticks, None))
    }

    pub fn with_reports(
        injector: FailureInjector,
        sampler: AvailabilitySampler,
        topology: Topology,
        recovery_ticks: usize,
        reports: Arc<dyn ReportStore>,
    ) -> Arc<Self> {
        Arc::new(Self::build(
            injector,
            sampler,
            topology,
            recovery_ticks,
            Some(reports),
        ))
    }

    fn build(
        injector: FailureInjector,
        sampler: AvailabilitySampler,
        topology: Topology,
        recovery_ticks: usize,
        reports: Option<Arc<dyn ReportStore>>,
    ) -> Self {
        Self {
            injector,
            sampler,
            topology,
            recovery_ticks,
            run_slot: LeaseSlot::new(),
            phase: AtomicU8::new(SimulationPhase::Idle.as_u8()),
            tick: AtomicUsize::new(0),
            active: Mutex::new(None),
            reports,
        }
    }

    pub fn injector(&self) -> &FailureInjector {
        &self.injector
    }

    pub fn phase(&self) -> SimulationPhase {
        SimulationPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    fn set_phase(&self, phase: SimulationPhase) {
        tracing::debug!("Simulation phase -> {:?}", phase);
        self.phase.store(phase.as_u8(), Ordering::SeqCst);
    }

    pub fn status(&self) -> SimulationStatus {
        let simulation_id = self
            .active
            .lock()
            .ok()
            .and_then(|a| a.as_ref().map(|run| run.simulation_id.clone()));

        SimulationStatus {
            running: self.run_slot.is_held(),
            phase: self.phase(),
            tick: self.tick.load(Ordering::SeqCst),
            simulation_id,
        }
    }

    /// Requests early termination of the running simulation. Returns its id.
    /// The run notices at its next tick boundary.
    pub fn stop(&self) -> Result<String, SimulationError> {
        let active = self.active.lock().map_err(|_| SimulationError::NotRunning)?;
        match active.as_ref() {
            Some(run) => {
                tracing::info!("Stop requested for simulation {}", run.simulation_id);
                run.stop.request();
                Ok(run.simulation_id.clone())
            }
            None => Err(SimulationError::NotRunning),
        }
    }

    pub fn cap_analysis(&self) -> CapAnalysis {
        classify(&self.topology)
    }

    /// Runs a full simulation. Fails only for requests rejected before any
    /// side effect (validation, conflict).
    pub async fn simulate(&self, config: FailureConfig) -> Result<SimulationReport, SimulationError> {
        self.injector.validate(&config)?;
        let run_lease = self
            .run_slot
            .try_acquire()
            .ok_or(SimulationError::AlreadyRunning)?;
        let _guard = RunGuard {
            engine: self,
            _lease: run_lease,
        };

        let started_at = Utc::now();
        self.set_phase(SimulationPhase::Injecting);
        let pending = self.injector.begin(&config)?;

        let stop = StopSignal::new();
        if let Ok(mut active) = self.active.lock() {
            *active = Some(ActiveRun {
                simulation_id: pending.simulation_id.clone(),
                stop: stop.clone(),
            });
        }

        let handle = self.injector.apply(pending).await;
        let simulation_id = handle.simulation_id.clone();
        let degraded = handle.degraded;
        let kind = config.probe_kind();

        let (outcome, window, recovery) = if handle.is_aborted() {
            self.set_phase(SimulationPhase::Reverting);
            self.injector.revert(handle).await;
            (RunOutcome::Aborted, Vec::new(), Vec::new())
        } else {
            self.set_phase(SimulationPhase::Sampling);
            let window = self
                .sampler
                .sample(config.duration, kind, &stop, &self.tick)
                .await;
            let stopped = stop.is_requested();

            self.set_phase(SimulationPhase::Reverting);
            let revert = self.injector.revert(handle).await;
            if !revert.restored {
                tracing::warn!(
                    "Simulation {} finished with the cluster only partially restored; check cluster status",
                    simulation_id
                );
            }

            if stopped || stop.is_requested() {
                (RunOutcome::Stopped, window, Vec::new())
            } else {
                self.set_phase(SimulationPhase::Recovering);
                let recovery_progress = AtomicUsize::new(0);
                let recovery = self
                    .sampler
                    .run(self.recovery_ticks, kind, &stop, &recovery_progress)
                    .await;
                // A stop during recovery cuts the curve short; keep what was seen.
                if stop.is_requested() && recovery.len() < self.recovery_ticks {
                    (RunOutcome::Stopped, window, recovery)
                } else {
                    (RunOutcome::Completed, window, recovery)
                }
            }
        };

        self.set_phase(SimulationPhase::Analyzed);
        let mode = SimulationMode { outcome, degraded };
        let summary = analyze(&RunRecord {
            simulation_id: &simulation_id,
            config: &config,
            tick_interval: self.sampler.tick_interval(),
            window: &window,
            recovery: &recovery,
            mode,
            started_at,
            finished_at: Utc::now(),
        });

        tracing::info!(
            "Simulation {} finished: mode={} mongo_downtime={}s cassandra_downtime={}s recovery={}s",
            simulation_id,
            summary.mode,
            summary.mongodb_downtime_seconds,
            summary.cassandra_downtime_seconds,
            summary.recovery_time_seconds
        );

        let result = SimulationResult {
            summary,
            recovery_metrics: recovery_curve(&recovery),
            availability_metrics: window,
        };

        if let Some(store) = &self.reports {
            if let Err(e) = persist_simulation(store.as_ref(), &result).await {
                tracing::error!("Failed to persist report for {}: {}", simulation_id, e);
            }
        }

        Ok(SimulationReport {
            result,
            cap_analysis: self.cap_analysis(),
        })
    }
}
