use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use clap::Parser;
use cluster_failure_lab::cap::handlers::handle_cap_analysis;
use cluster_failure_lab::clock::{Clock, TokioClock};
use cluster_failure_lab::cluster::handlers::{handle_cluster_status, handle_container_uptimes};
use cluster_failure_lab::cluster::process::{DockerProcessControl, ProcessControl};
use cluster_failure_lab::cluster::types::{DatabaseKind, MemberRegistry};
use cluster_failure_lab::config::Settings;
use cluster_failure_lab::performance::handlers::{
    handle_cleanup, handle_request_stats, handle_run_performance, handle_test_latency,
};
use cluster_failure_lab::performance::protocol::*;
use cluster_failure_lab::performance::runner::PerformanceRunner;
use cluster_failure_lab::performance::stats::{MeteredDatabase, RequestStats};
use cluster_failure_lab::probe::handle::{DatabaseHandle, DatabaseHandles, HttpDatabaseHandle};
use cluster_failure_lab::probe::probe::ClusterProbe;
use cluster_failure_lab::reports::handlers::{
    handle_get_report, handle_latest_report, handle_list_reports,
};
use cluster_failure_lab::reports::store::{FsReportStore, ReportStore};
use cluster_failure_lab::simulation::engine::SimulationEngine;
use cluster_failure_lab::simulation::handlers::{
    handle_health, handle_simulate, handle_status, handle_stop,
};
use cluster_failure_lab::simulation::injector::FailureInjector;
use cluster_failure_lab::simulation::protocol::*;
use cluster_failure_lab::simulation::sampler::AvailabilitySampler;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();

    tracing_subscriber::fmt()
        .with_max_level(settings.log_level)
        .init();

    tracing::info!("Starting failure controller on {}", settings.bind);

    // 1. Cluster members and process control:
    let registry = MemberRegistry::from_names(&settings.mongo_members, &settings.cassandra_members);
    tracing::info!("Known members: {:?}", registry.names());

    let control: Arc<dyn ProcessControl> = Arc::new(DockerProcessControl::new(
        settings.docker_bin.clone(),
        settings.cluster_network.clone(),
    ));

    // 2. Database handles, every call counted in the request stats:
    let stats = RequestStats::new();
    let database = |kind: DatabaseKind, url: &str, collection: &str| {
        let handle: Arc<dyn DatabaseHandle> =
            Arc::new(HttpDatabaseHandle::new(kind, url, collection));
        MeteredDatabase::wrap(handle, stats.clone())
    };
    let mongo = database(DatabaseKind::Mongo, &settings.mongo_url, &settings.probe_collection);
    let cassandra = database(
        DatabaseKind::Cassandra,
        &settings.cassandra_url,
        &settings.probe_collection,
    );
    let handles = DatabaseHandles {
        mongo: mongo.clone(),
        cassandra: cassandra.clone(),
    };

    // 3. Simulation engine:
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
    let sampler = AvailabilitySampler::new(
        ClusterProbe::new(settings.probe_timeout()),
        mongo,
        cassandra,
        clock,
        settings.tick_interval(),
    );
    let injector = FailureInjector::new(control.clone(), registry.clone(), settings.max_duration_secs);
    let topology = Arc::new(settings.topology());
    let reports: Arc<dyn ReportStore> = Arc::new(FsReportStore::new(settings.report_dir.clone()));

    let recovery_ticks = settings.recovery_ticks as usize;
    let engine = if settings.persist_reports {
        tracing::info!("Reports are saved under {}", settings.report_dir.display());
        SimulationEngine::with_reports(
            injector,
            sampler,
            topology.as_ref().clone(),
            recovery_ticks,
            reports.clone(),
        )
    } else {
        SimulationEngine::new(injector, sampler, topology.as_ref().clone(), recovery_ticks)
    };

    // 4. Performance runner:
    let perf_mongo = database(
        DatabaseKind::Mongo,
        &settings.mongo_url,
        &settings.performance_collection,
    );
    let perf_cassandra = database(
        DatabaseKind::Cassandra,
        &settings.cassandra_url,
        &settings.performance_collection,
    );
    let runner = if settings.persist_reports {
        PerformanceRunner::with_reports(perf_mongo, perf_cassandra, reports.clone())
    } else {
        PerformanceRunner::new(perf_mongo, perf_cassandra)
    };

    // 5. HTTP Router:
    let app = Router::new()
        .route(ENDPOINT_SIMULATE, post(handle_simulate))
        .route(ENDPOINT_STOP, post(handle_stop))
        .route(ENDPOINT_STATUS, get(handle_status))
        .route(ENDPOINT_CONTAINER_UPTIMES, get(handle_container_uptimes))
        .route(ENDPOINT_CAP_ANALYSIS, get(handle_cap_analysis))
        .route(ENDPOINT_CLUSTER_STATUS, get(handle_cluster_status))
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(ENDPOINT_PERFORMANCE_RUN, post(handle_run_performance))
        .route(ENDPOINT_PERFORMANCE_CLEANUP, post(handle_cleanup))
        .route(ENDPOINT_TEST_LATENCY, get(handle_test_latency))
        .route(ENDPOINT_REQUEST_STATS, get(handle_request_stats))
        .route(ENDPOINT_REPORTS, get(handle_list_reports))
        .route(ENDPOINT_LATEST_REPORT, get(handle_latest_report))
        .route(ENDPOINT_REPORT, get(handle_get_report))
        .layer(Extension(engine))
        .layer(Extension(runner))
        .layer(Extension(stats))
        .layer(Extension(control))
        .layer(Extension(registry))
        .layer(Extension(handles))
        .layer(Extension(topology))
        .layer(Extension(reports));

    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    tracing::info!("HTTP server listening on {}", settings.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
