//! Request Statistics
//!
//! Counts every request the controller sends to each database and the time it
//! took. Reading a database's counters resets them, so a dashboard polling at a
//! fixed interval sees requests per interval.

use crate::cluster::types::DatabaseKind;
use crate::probe::handle::DatabaseHandle;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
struct Counter {
    count: u64,
    total: Duration,
}

/// Counters drained by one read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Requests since the previous read.
    pub throughput: u64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Default)]
pub struct RequestStats {
    counters: DashMap<DatabaseKind, Counter>,
}

impl RequestStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, database: DatabaseKind, elapsed: Duration) {
        let mut counter = self.counters.entry(database).or_default();
        counter.count += 1;
        counter.total += elapsed;
    }

    /// Returns the counters for `database` and resets them.
    pub fn take(&self, database: DatabaseKind) -> StatsSnapshot {
        let counter = self
            .counters
            .remove(&database)
            .map(|(_, counter)| counter)
            .unwrap_or_default();

        let avg_latency_ms = if counter.count == 0 {
            0.0
        } else {
            counter.total.as_micros() as f64 / 1000.0 / counter.count as f64
        };

        StatsSnapshot {
            throughput: counter.count,
            avg_latency_ms,
        }
    }
}

/// `DatabaseHandle` wrapper that records every call, failed or not, in
/// `RequestStats`.
pub struct MeteredDatabase {
    inner: Arc<dyn DatabaseHandle>,
    stats: Arc<RequestStats>,
}

impl MeteredDatabase {
    pub fn wrap(inner: Arc<dyn DatabaseHandle>, stats: Arc<RequestStats>) -> Arc<dyn DatabaseHandle> {
        Arc::new(Self { inner, stats })
    }

    async fn timed<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let started = Instant::now();
        let result = call.await;
        self.stats.record(self.inner.kind(), started.elapsed());
        result
    }
}

#[async_trait]
impl DatabaseHandle for MeteredDatabase {
    fn kind(&self) -> DatabaseKind {
        self.inner.kind()
    }

    async fn ping(&self) -> Result<()> {
        self.timed(self.inner.ping()).await
    }

    async fn find(&self, filter: Value) -> Result<Value> {
        self.timed(self.inner.find(filter)).await
    }

    async fn insert(&self, document: Value) -> Result<Value> {
        self.timed(self.inner.insert(document)).await
    }

    async fn update(&self, filter: Value, update: Value) -> Result<Value> {
        self.timed(self.inner.update(filter, update)).await
    }

    async fn delete(&self, filter: Value) -> Result<Value> {
        self.timed(self.inner.delete(filter)).await
    }

    async fn status(&self) -> Result<Value> {
        self.timed(self.inner.status()).await
    }
}
