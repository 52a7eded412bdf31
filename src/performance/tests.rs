//! Performance Module Tests
//!
//! ## Test Scopes
//! - **Config**: Defaults, bounds and test-type parsing.
//! - **Workload**: Batch timing, operation selection and error counting.
//! - **Runner**: Cleanup, concurrency guard, aggregation and report persistence.
//! - **Request Stats**: Counting through the metering wrapper and reset on read.
//! - **Handlers**: Status codes and response bodies.

#[cfg(test)]
mod tests {
    use crate::cluster::types::DatabaseKind;
    use crate::error::PerformanceError;
    use crate::performance::handlers::{
        handle_cleanup, handle_request_stats, handle_run_performance, handle_test_latency,
    };
    use crate::performance::protocol::DatabaseParams;
    use crate::performance::runner::{PerformanceRunner, run_workload};
    use crate::performance::stats::{MeteredDatabase, RequestStats};
    use crate::performance::types::{
        PerformanceTestConfig, TestType, generate_test_data,
    };
    use crate::probe::handle::DatabaseHandle;
    use crate::reports::store::{FsReportStore, ReportStore, render_performance_markdown};
    use crate::testing::FakeDatabase;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::{Extension, Json};
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    fn config(operation_count: u32, batch_size: u32, test_type: TestType) -> PerformanceTestConfig {
        PerformanceTestConfig {
            operation_count,
            batch_size,
            test_type,
            ..Default::default()
        }
    }

    fn fakes() -> (Arc<FakeDatabase>, Arc<FakeDatabase>) {
        (
            FakeDatabase::new(DatabaseKind::Mongo),
            FakeDatabase::new(DatabaseKind::Cassandra),
        )
    }

    fn params(db: &str) -> Query<DatabaseParams> {
        Query(DatabaseParams { db: db.to_string() })
    }

    // ============================================================
    // CONFIG
    // ============================================================

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let parsed: PerformanceTestConfig = serde_json::from_str(r#"{"testType": "read"}"#).unwrap();

        assert_eq!(parsed.operation_count, 1000);
        assert_eq!(parsed.batch_size, 100);
        assert_eq!(parsed.test_type, TestType::Read);
        assert!(parsed.validate().is_ok());

        assert!(serde_json::from_str::<PerformanceTestConfig>(r#"{"testType": "scan"}"#).is_err());
        assert!(
            serde_json::from_str::<PerformanceTestConfig>(r#"{"consistencyLevel": "quorum"}"#)
                .is_err()
        );
    }

    #[test]
    fn test_config_bounds_are_enforced() {
        for bad in [
            config(0, 10, TestType::Mixed),
            config(10_001, 10, TestType::Mixed),
            config(10, 0, TestType::Mixed),
            config(10, 1_001, TestType::Mixed),
        ] {
            let err = bad.validate().unwrap_err();
            assert!(matches!(err, PerformanceError::InvalidConfig(_)));
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
        assert!(config(10_000, 1_000, TestType::Write).validate().is_ok());
    }

    #[test]
    fn test_generated_documents_cycle_status_and_type() {
        let docs = generate_test_data(9, Utc::now());

        let statuses: Vec<&str> = docs.iter().take(3).map(|d| d.status).collect();
        assert_eq!(statuses, vec!["ACTIVE", "INACTIVE", "MAINTENANCE"]);
        assert_eq!(docs[0].device_type, "sensor");
        assert_eq!(docs[3].device_type, "actuator");
        assert_eq!(docs[6].device_type, "controller");
        assert!(docs.iter().all(|d| (0.0..100.0).contains(&d.value)));
        assert_ne!(docs[0].id, docs[1].id);
        assert_eq!(docs[4].to_json()["name"], "Device 4");
    }

    // ============================================================
    // WORKLOAD
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_mixed_workload_times_every_batch_phase() {
        // ARRANGE: every call takes 10ms of paused time
        let db = FakeDatabase::new(DatabaseKind::Mongo);
        db.set_delay(Duration::from_millis(10));
        let cfg = config(4, 2, TestType::Mixed);
        let docs = generate_test_data(4, Utc::now());

        // ACT
        let result = run_workload(db.as_ref(), &cfg, &docs).await;

        // ASSERT: two batches of insert, insert, find, update, update
        assert_eq!(result.latencies.insert, vec![20.0, 20.0]);
        assert_eq!(result.latencies.read, vec![10.0, 10.0]);
        assert_eq!(result.latencies.update, vec![20.0, 20.0]);
        assert_eq!(result.errors, 0);
        assert_eq!(result.total_operations, 4);
        assert_eq!(result.total_time_ms, 100.0);
        assert_eq!(result.throughput, 40.0);
        assert_eq!(
            db.ops(),
            vec![
                "insert", "insert", "find", "update", "update", "insert", "insert", "find",
                "update", "update"
            ]
        );
    }

    #[tokio::test]
    async fn test_test_type_selects_operations() {
        let docs = generate_test_data(3, Utc::now());

        let writer = FakeDatabase::new(DatabaseKind::Mongo);
        let result = run_workload(writer.as_ref(), &config(3, 3, TestType::Write), &docs).await;
        assert_eq!(writer.ops(), vec!["insert", "insert", "insert"]);
        assert!(result.latencies.read.is_empty());
        assert!(result.latencies.update.is_empty());

        let reader = FakeDatabase::new(DatabaseKind::Cassandra);
        run_workload(reader.as_ref(), &config(3, 3, TestType::Read), &docs).await;
        assert_eq!(reader.ops(), vec!["insert", "insert", "insert", "find"]);

        let updater = FakeDatabase::new(DatabaseKind::Cassandra);
        run_workload(updater.as_ref(), &config(3, 3, TestType::Update), &docs).await;
        assert_eq!(updater.ops().iter().filter(|op| **op == "update").count(), 3);
        assert!(!updater.ops().contains(&"find"));
    }

    #[tokio::test]
    async fn test_failed_call_ends_its_batch_and_counts_one_error() {
        // ARRANGE: the second insert of the first batch fails
        let db = FakeDatabase::new(DatabaseKind::Cassandra);
        db.script(&[true, false]);
        let docs = generate_test_data(4, Utc::now());

        // ACT
        let result = run_workload(db.as_ref(), &config(4, 2, TestType::Write), &docs).await;

        // ASSERT
        assert_eq!(result.errors, 1);
        assert_eq!(result.latencies.insert.len(), 1);
        assert_eq!(db.calls(), 4);
    }

    // ============================================================
    // RUNNER
    // ============================================================

    #[tokio::test]
    async fn test_run_cleans_up_then_compares_both_databases() {
        // ARRANGE: cassandra rejects every call after cleanup
        let (mongo, cassandra) = fakes();
        let runner = PerformanceRunner::new(mongo.clone(), cassandra.clone());
        cassandra.script(&[true]);
        cassandra.set_down(true);

        // ACT
        let result = runner.run(config(6, 3, TestType::Mixed)).await.unwrap();

        // ASSERT
        assert_eq!(mongo.ops()[0], "delete");
        assert_eq!(cassandra.ops()[0], "delete");
        assert_eq!(result.summary.total_ops, 6);
        assert_eq!(result.summary.errors, 2);
        assert_eq!(result.detailed_results.mongo.errors, 0);
        assert_eq!(result.detailed_results.mongo.latencies.insert.len(), 2);

        let operations: Vec<&str> = result
            .latency_metrics
            .iter()
            .map(|m| m.operation.as_str())
            .collect();
        assert_eq!(operations, vec!["insert", "read", "update"]);
        assert!(result.latency_metrics.iter().all(|m| m.cassandra == 0.0));

        let dbs: Vec<&str> = result.throughput_metrics.iter().map(|m| m.db.as_str()).collect();
        assert_eq!(dbs, vec!["MongoDB", "Cassandra"]);
        assert!(!runner.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_run_is_rejected() {
        let (mongo, cassandra) = fakes();
        mongo.set_delay(Duration::from_millis(50));
        let runner = PerformanceRunner::new(mongo.clone(), cassandra);

        let first = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.run(config(2, 1, TestType::Write)).await })
        };
        while !runner.is_running() {
            tokio::task::yield_now().await;
        }

        let err = runner.run(config(2, 1, TestType::Write)).await.unwrap_err();

        assert!(matches!(err, PerformanceError::AlreadyRunning));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(first.await.unwrap().is_ok());
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_block_the_run() {
        let (mongo, cassandra) = fakes();
        mongo.script(&[false]);
        let runner = PerformanceRunner::new(mongo.clone(), cassandra);

        let result = runner.run(config(1, 1, TestType::Write)).await.unwrap();

        assert_eq!(result.summary.errors, 0);
        assert_eq!(mongo.ops(), vec!["delete", "insert"]);
    }

    #[tokio::test]
    async fn test_run_is_persisted_as_json_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ReportStore> = Arc::new(FsReportStore::new(dir.path()));
        let (mongo, cassandra) = fakes();
        let runner = PerformanceRunner::with_reports(mongo, cassandra, store.clone());

        let result = runner.run(config(4, 2, TestType::Mixed)).await.unwrap();

        let names = store.list().await.unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.starts_with("performance_")));
        let json_name = names.iter().find(|n| n.ends_with(".json")).unwrap();
        let saved: serde_json::Value =
            serde_json::from_slice(&store.read(json_name).await.unwrap()).unwrap();
        assert_eq!(saved["summary"]["runId"], result.summary.run_id.as_str());
        assert_eq!(saved["summary"]["totalOps"], 4);
        assert_eq!(saved["throughputMetrics"][1]["db"], "Cassandra");
    }

    #[tokio::test]
    async fn test_performance_markdown_lists_tables() {
        let (mongo, cassandra) = fakes();
        let runner = PerformanceRunner::new(mongo, cassandra);
        let result = runner.run(config(2, 2, TestType::Mixed)).await.unwrap();

        let markdown = render_performance_markdown(&result);

        assert!(markdown.starts_with("# Performance Report"));
        assert!(markdown.contains("- **totalOps**: 2"));
        assert!(markdown.contains("- **testType**: mixed"));
        assert!(markdown.contains("- insert | MongoDB:"));
        assert!(markdown.contains("- Cassandra:"));
    }

    // ============================================================
    // REQUEST STATS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_metered_handle_counts_calls_and_resets_on_read() {
        // ARRANGE
        let stats = RequestStats::new();
        let fake = FakeDatabase::new(DatabaseKind::Mongo);
        fake.set_delay(Duration::from_millis(4));
        let metered = MeteredDatabase::wrap(fake.clone(), stats.clone());

        // ACT
        metered.ping().await.unwrap();
        metered.insert(serde_json::json!({})).await.unwrap();
        fake.set_down(true);
        assert!(metered.find(serde_json::json!({})).await.is_err());

        // ASSERT
        assert_eq!(metered.kind(), DatabaseKind::Mongo);
        let snapshot = stats.take(DatabaseKind::Mongo);
        assert_eq!(snapshot.throughput, 3);
        assert_eq!(snapshot.avg_latency_ms, 4.0);

        let drained = stats.take(DatabaseKind::Mongo);
        assert_eq!(drained.throughput, 0);
        assert_eq!(drained.avg_latency_ms, 0.0);
        assert_eq!(stats.take(DatabaseKind::Cassandra).throughput, 0);
    }

    // ============================================================
    // HANDLERS
    // ============================================================

    #[tokio::test]
    async fn test_run_handler_maps_errors_to_status_codes() {
        let (mongo, cassandra) = fakes();
        let runner = PerformanceRunner::new(mongo, cassandra);

        let ok = handle_run_performance(
            Extension(runner.clone()),
            Ok(Json(config(2, 1, TestType::Mixed))),
        )
        .await;
        assert!(ok.is_ok());

        let (status, Json(body)) = handle_run_performance(
            Extension(runner),
            Ok(Json(config(0, 1, TestType::Mixed))),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.detail.contains("operationCount"));
    }

    #[tokio::test]
    async fn test_cleanup_handler_empties_both_databases() {
        let (mongo, cassandra) = fakes();
        let runner = PerformanceRunner::new(mongo.clone(), cassandra.clone());

        let Json(body) = handle_cleanup(Extension(runner)).await;

        assert_eq!(body.status, "Cleaned successfully");
        assert_eq!(mongo.ops(), vec!["delete"]);
        assert_eq!(cassandra.ops(), vec!["delete"]);
    }

    #[tokio::test]
    async fn test_latency_handler_pings_the_named_database() {
        let (mongo, cassandra) = fakes();
        cassandra.set_down(true);
        let runner = PerformanceRunner::new(mongo.clone(), cassandra.clone());

        let Json(up) = handle_test_latency(Extension(runner.clone()), params("MongoDB"))
            .await
            .unwrap();
        let Json(down) = handle_test_latency(Extension(runner.clone()), params("cassandra"))
            .await
            .unwrap();
        let (status, _) = handle_test_latency(Extension(runner), params("redis"))
            .await
            .unwrap_err();

        assert_eq!(up.db, "mongo");
        assert_eq!(up.status, "success");
        assert!(up.latency >= 0.0);
        assert_eq!(down.status, "failed");
        assert!(down.error.unwrap().contains("unreachable"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(mongo.ops(), vec!["ping"]);
    }

    #[tokio::test]
    async fn test_stats_handler_drains_counters() {
        let stats = RequestStats::new();
        stats.record(DatabaseKind::Cassandra, Duration::from_millis(6));
        stats.record(DatabaseKind::Cassandra, Duration::from_millis(2));

        let Json(first) = handle_request_stats(Extension(stats.clone()), params("cassandra"))
            .await
            .unwrap();
        let Json(second) = handle_request_stats(Extension(stats.clone()), params("cassandra"))
            .await
            .unwrap();
        let (status, _) = handle_request_stats(Extension(stats), params("general"))
            .await
            .unwrap_err();

        assert_eq!(first.throughput, 2);
        assert_eq!(first.avg_latency_ms, 4.0);
        assert_eq!(second.throughput, 0);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
