//! Availability Sampler
//!
//! A bounded loop that probes both databases once per tick. Each tick waits for
//! its deadline on the injected clock, then probes the two databases
//! concurrently. Stop requests are honoured only at tick boundaries; a probe
//! already in flight runs to completion or timeout.
//!
//! The window is bounded on the clock as well as by tick count: a tick that
//! would start after `ticks * tick_interval` is dropped, so probes that run into
//! their timeout cannot stretch the disruption past the requested window by
//! more than one probe timeout.

use super::types::AvailabilityPoint;
use crate::clock::Clock;
use crate::probe::handle::DatabaseHandle;
use crate::probe::probe::ClusterProbe;
use crate::probe::types::ProbeKind;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Cooperative cancellation flag checked by the sampler between ticks.
#[derive(Debug, Default)]
pub struct StopSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once a stop has been requested.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }
}

/// Number of ticks needed to cover `duration`: `ceil(duration / tick)`.
pub fn tick_count(duration: Duration, tick: Duration) -> usize {
    if tick.is_zero() {
        return 0;
    }
    let d = duration.as_millis();
    let t = tick.as_millis();
    d.div_ceil(t) as usize
}

/// Formats elapsed time as the tick label, e.g. `"5s"` or `"2.5s"`.
pub fn tick_label(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("{}s", secs as u64)
    } else {
        format!("{:.1}s", secs)
    }
}

/// Shortest tick the sampler accepts; a zero tick would sample nothing.
pub const MIN_TICK: Duration = Duration::from_millis(1);

pub struct AvailabilitySampler {
    probe: ClusterProbe,
    mongo: Arc<dyn DatabaseHandle>,
    cassandra: Arc<dyn DatabaseHandle>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
}

impl AvailabilitySampler {
    pub fn new(
        probe: ClusterProbe,
        mongo: Arc<dyn DatabaseHandle>,
        cassandra: Arc<dyn DatabaseHandle>,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            probe,
            mongo,
            cassandra,
            clock,
            tick_interval: tick_interval.max(MIN_TICK),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Samples for `duration_secs`, i.e. `ceil(duration / tick)` ticks.
    pub async fn sample(
        &self,
        duration_secs: u64,
        kind: ProbeKind,
        stop: &StopSignal,
        progress: &AtomicUsize,
    ) -> Vec<AvailabilityPoint> {
        let ticks = tick_count(Duration::from_secs(duration_secs), self.tick_interval);
        self.run(ticks, kind, stop, progress).await
    }

    /// Runs at most `ticks` ticks, ending early when stopped or when the clock
    /// passes the end of the window. Returns the points collected so far; never
    /// fails.
    pub async fn run(
        &self,
        ticks: usize,
        kind: ProbeKind,
        stop: &StopSignal,
        progress: &AtomicUsize,
    ) -> Vec<AvailabilityPoint> {
        let start = self.clock.now();
        let window = self.tick_interval * ticks as u32;
        let mut points = Vec::with_capacity(ticks);

        for tick in 0..ticks {
            let deadline = start + self.tick_interval * (tick as u32 + 1);
            let wait = deadline.saturating_sub(self.clock.now());

            tokio::select! {
                _ = self.clock.sleep(wait) => {}
                _ = stop.wait() => {}
            }

            if stop.is_requested() {
                tracing::info!("Stop requested, sampler ending after {} of {} ticks", tick, ticks);
                break;
            }

            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed > window {
                tracing::info!(
                    "Window of {:?} elapsed after {} of {} ticks, dropping the rest",
                    window,
                    tick,
                    ticks
                );
                break;
            }

            let label = tick_label(elapsed);
            let (mongo, cassandra) = tokio::join!(
                self.probe.probe(self.mongo.as_ref(), kind),
                self.probe.probe(self.cassandra.as_ref(), kind),
            );

            tracing::debug!(
                "Tick {}/{} at {}: mongo={} cassandra={}",
                tick + 1,
                ticks,
                label,
                mongo.success,
                cassandra.success
            );

            points.push(AvailabilityPoint {
                time: label,
                operation: kind,
                mongo,
                cassandra,
            });
            progress.store(tick + 1, Ordering::SeqCst);
        }

        points
    }
}
