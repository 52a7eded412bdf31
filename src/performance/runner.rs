//! Performance Runner
//!
//! Runs the same generated workload against both databases concurrently. Each
//! batch inserts its documents one by one, then optionally reads every `ACTIVE`
//! document once and updates each of its documents by id. Every phase of a
//! batch is timed as a whole; the first failing call ends the batch and counts
//! one error.

use super::types::{
    DatabaseRunResult, DetailedResults, LatencyMetric, PerformanceSummary, PerformanceTestConfig,
    PerformanceTestResult, TestDocument, ThroughputMetric, generate_test_data,
};
use crate::cluster::types::DatabaseKind;
use crate::error::PerformanceError;
use crate::probe::handle::DatabaseHandle;
use crate::reports::store::{ReportStore, persist_performance};
use crate::simulation::lease::LeaseSlot;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_micros() as f64 / 1000.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Result of a single round trip to one database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatencyCheck {
    pub db: DatabaseKind,
    /// Round-trip time of one ping, in milliseconds.
    pub latency: f64,
    pub success: bool,
    pub error: Option<String>,
}

pub struct PerformanceRunner {
    mongo: Arc<dyn DatabaseHandle>,
    cassandra: Arc<dyn DatabaseHandle>,
    slot: LeaseSlot,
    reports: Option<Arc<dyn ReportStore>>,
}

impl PerformanceRunner {
    pub fn new(mongo: Arc<dyn DatabaseHandle>, cassandra: Arc<dyn DatabaseHandle>) -> Arc<Self> {
        Arc::new(Self {
            mongo,
            cassandra,
            slot: LeaseSlot::new(),
            reports: None,
        })
    }

    pub fn with_reports(
        mongo: Arc<dyn DatabaseHandle>,
        cassandra: Arc<dyn DatabaseHandle>,
        reports: Arc<dyn ReportStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            mongo,
            cassandra,
            slot: LeaseSlot::new(),
            reports: Some(reports),
        })
    }

    pub fn is_running(&self) -> bool {
        self.slot.is_held()
    }

    fn handle(&self, database: DatabaseKind) -> &dyn DatabaseHandle {
        match database {
            DatabaseKind::Mongo => self.mongo.as_ref(),
            DatabaseKind::Cassandra => self.cassandra.as_ref(),
        }
    }

    /// Empties the performance collection on both databases. Failures are
    /// logged and otherwise ignored.
    pub async fn cleanup(&self) {
        let (mongo, cassandra) = tokio::join!(
            self.mongo.delete(json!({})),
            self.cassandra.delete(json!({})),
        );
        for (database, result) in [(DatabaseKind::Mongo, mongo), (DatabaseKind::Cassandra, cassandra)] {
            if let Err(e) = result {
                tracing::warn!("{} cleanup failed: {:#}", database, e);
            }
        }
    }

    /// Times one ping against `database`.
    pub async fn measure_latency(&self, database: DatabaseKind) -> LatencyCheck {
        let started = Instant::now();
        let result = self.handle(database).ping().await;
        let latency = millis(started.elapsed());
        tracing::info!("Latency check for {}: {:.3} ms", database, latency);

        LatencyCheck {
            db: database,
            latency,
            success: result.is_ok(),
            error: result.err().map(|e| format!("{:#}", e)),
        }
    }

    pub async fn run(
        &self,
        config: PerformanceTestConfig,
    ) -> Result<PerformanceTestResult, PerformanceError> {
        config.validate()?;
        let _lease = self
            .slot
            .try_acquire()
            .ok_or(PerformanceError::AlreadyRunning)?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        tracing::info!(
            "Performance run {} starting: {} {} ops in batches of {}",
            run_id,
            config.operation_count,
            config.test_type,
            config.batch_size
        );

        self.cleanup().await;
        let documents = generate_test_data(config.operation_count, started_at);

        let (mongo, cassandra) = tokio::join!(
            run_workload(self.mongo.as_ref(), &config, &documents),
            run_workload(self.cassandra.as_ref(), &config, &documents),
        );

        let result = build_result(run_id, &config, mongo, cassandra, started_at);
        tracing::info!(
            "Performance run {} finished: mongo {:.1} ops/s, cassandra {:.1} ops/s, {} errors",
            result.summary.run_id,
            result.detailed_results.mongo.throughput,
            result.detailed_results.cassandra.throughput,
            result.summary.errors
        );

        if let Some(store) = &self.reports {
            if let Err(e) = persist_performance(store.as_ref(), &result).await {
                tracing::error!("Failed to persist performance report: {}", e);
            }
        }

        Ok(result)
    }
}

/// Runs the batched workload against one database.
pub async fn run_workload(
    handle: &dyn DatabaseHandle,
    config: &PerformanceTestConfig,
    documents: &[TestDocument],
) -> DatabaseRunResult {
    let mut result = DatabaseRunResult {
        total_operations: config.operation_count,
        ..Default::default()
    };
    let started = Instant::now();

    for batch in documents.chunks(config.batch_size as usize) {
        if let Err(e) = run_batch(handle, config, batch, &mut result).await {
            result.errors += 1;
            tracing::error!("{} batch failed: {:#}", handle.kind(), e);
        }
    }

    let total = started.elapsed();
    result.total_time_ms = millis(total);
    result.throughput = if total.is_zero() {
        0.0
    } else {
        config.operation_count as f64 / total.as_secs_f64()
    };
    result
}

async fn run_batch(
    handle: &dyn DatabaseHandle,
    config: &PerformanceTestConfig,
    batch: &[TestDocument],
    result: &mut DatabaseRunResult,
) -> anyhow::Result<()> {
    let started = Instant::now();
    for document in batch {
        handle.insert(document.to_json()).await?;
    }
    result.latencies.insert.push(millis(started.elapsed()));

    if config.test_type.reads() {
        let started = Instant::now();
        handle.find(json!({ "status": "ACTIVE" })).await?;
        result.latencies.read.push(millis(started.elapsed()));
    }

    if config.test_type.updates() {
        let started = Instant::now();
        for document in batch {
            handle
                .update(json!({ "id": document.id }), json!({ "status": "UPDATED" }))
                .await?;
        }
        result.latencies.update.push(millis(started.elapsed()));
    }

    Ok(())
}

/// Folds both databases' results into the comparison tables.
pub fn build_result(
    run_id: String,
    config: &PerformanceTestConfig,
    mongo: DatabaseRunResult,
    cassandra: DatabaseRunResult,
    started_at: chrono::DateTime<Utc>,
) -> PerformanceTestResult {
    let latency_metrics = vec![
        LatencyMetric {
            operation: "insert".to_string(),
            mongodb: mean(&mongo.latencies.insert),
            cassandra: mean(&cassandra.latencies.insert),
        },
        LatencyMetric {
            operation: "read".to_string(),
            mongodb: mean(&mongo.latencies.read),
            cassandra: mean(&cassandra.latencies.read),
        },
        LatencyMetric {
            operation: "update".to_string(),
            mongodb: mean(&mongo.latencies.update),
            cassandra: mean(&cassandra.latencies.update),
        },
    ];

    let throughput_metrics = vec![
        ThroughputMetric {
            db: DatabaseKind::Mongo.display_name().to_string(),
            throughput: mongo.throughput,
        },
        ThroughputMetric {
            db: DatabaseKind::Cassandra.display_name().to_string(),
            throughput: cassandra.throughput,
        },
    ];

    PerformanceTestResult {
        summary: PerformanceSummary {
            run_id,
            total_ops: config.operation_count,
            errors: mongo.errors + cassandra.errors,
            batch_size: config.batch_size,
            test_type: config.test_type,
            consistency_level: config.consistency_level,
            started_at,
            finished_at: Utc::now(),
        },
        latency_metrics,
        throughput_metrics,
        detailed_results: DetailedResults { mongo, cassandra },
    }
}
