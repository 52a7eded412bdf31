//! Recovery Analyzer
//!
//! Reduces the sampled series into a `SimulationSummary` and a recovery curve.
//!
//! - **Downtime**: length of the first contiguous run of failing ticks times the
//!   tick interval, capped at the configured duration. A run that lasts to the
//!   end of the window counts every tick from the first failure onwards.
//! - **Data loss**: write probes issued during the window that were never
//!   acknowledged. This is a proxy; it does not compare pre/post state.
//! - **Recovery time**: seconds from revert to the first post-revert tick where
//!   both databases succeed, or the configured duration if that never happens.
//! - **Recovery curve**: per post-revert tick, the success percentage of each
//!   database over a trailing window of `RECOVERY_CURVE_WINDOW` ticks.

use super::types::{
    AvailabilityPoint, FailureConfig, RecoveryPoint, RunOutcome, SimulationMode, SimulationSummary,
};
use crate::cluster::types::DatabaseKind;

use chrono::{DateTime, Utc};
use std::time::Duration;

pub const RECOVERY_CURVE_WINDOW: usize = 3;

/// Everything the analyzer needs about a finished run.
#[derive(Debug)]
pub struct RunRecord<'a> {
    pub simulation_id: &'a str,
    pub config: &'a FailureConfig,
    pub tick_interval: Duration,
    pub window: &'a [AvailabilityPoint],
    pub recovery: &'a [AvailabilityPoint],
    pub mode: SimulationMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub fn analyze(run: &RunRecord<'_>) -> SimulationSummary {
    let duration = run.config.duration;
    let (recovery_time_seconds, recovered) = if run.mode.outcome == RunOutcome::Aborted {
        (0.0, false)
    } else {
        recovery_time(run.recovery, run.tick_interval, duration)
    };

    SimulationSummary {
        simulation_id: run.simulation_id.to_string(),
        failure_type: run.config.failure_type,
        target_node: run.config.target_node.clone(),
        duration,
        mongodb_downtime_seconds: downtime_seconds(
            run.window,
            DatabaseKind::Mongo,
            run.tick_interval,
            duration,
        ),
        cassandra_downtime_seconds: downtime_seconds(
            run.window,
            DatabaseKind::Cassandra,
            run.tick_interval,
            duration,
        ),
        data_loss_mongo: data_loss(run.window, DatabaseKind::Mongo),
        data_loss_cassandra: data_loss(run.window, DatabaseKind::Cassandra),
        recovery_time_seconds,
        recovered,
        ticks: run.window.len(),
        mode: run.mode.to_string(),
        started_at: run.started_at,
        finished_at: run.finished_at,
    }
}

pub fn downtime_seconds(
    points: &[AvailabilityPoint],
    database: DatabaseKind,
    tick: Duration,
    duration_secs: u64,
) -> f64 {
    let Some(first_failure) = points.iter().position(|p| !p.outcome(database).success) else {
        return 0.0;
    };

    let run = points[first_failure..]
        .iter()
        .take_while(|p| !p.outcome(database).success)
        .count();

    (run as f64 * tick.as_secs_f64()).min(duration_secs as f64)
}

pub fn data_loss(points: &[AvailabilityPoint], database: DatabaseKind) -> u64 {
    points
        .iter()
        .flat_map(|p| p.samples())
        .filter(|s| s.database == database && s.kind.is_write() && !s.success)
        .count() as u64
}

/// Returns `(seconds, recovered)`.
pub fn recovery_time(recovery: &[AvailabilityPoint], tick: Duration, duration_secs: u64) -> (f64, bool) {
    match recovery.iter().position(|p| p.all_succeeded()) {
        Some(idx) => ((idx + 1) as f64 * tick.as_secs_f64(), true),
        None => (duration_secs as f64, false),
    }
}

pub fn recovery_curve(recovery: &[AvailabilityPoint]) -> Vec<RecoveryPoint> {
    (0..recovery.len())
        .map(|idx| {
            let from = (idx + 1).saturating_sub(RECOVERY_CURVE_WINDOW);
            let window = &recovery[from..=idx];
            RecoveryPoint {
                time: recovery[idx].time.clone(),
                mongo_recovery_percent: success_percent(window, DatabaseKind::Mongo),
                cassandra_recovery_percent: success_percent(window, DatabaseKind::Cassandra),
            }
        })
        .collect()
}

fn success_percent(window: &[AvailabilityPoint], database: DatabaseKind) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let ok = window.iter().filter(|p| p.outcome(database).success).count();
    let percent = ok as f64 * 100.0 / window.len() as f64;
    (percent * 10.0).round() / 10.0
}
