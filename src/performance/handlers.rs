use super::protocol::{CleanupResponse, DatabaseParams, LatencyResponse, RequestStatsResponse};
use super::runner::PerformanceRunner;
use super::stats::RequestStats;
use super::types::{PerformanceTestConfig, PerformanceTestResult};
use crate::cluster::types::DatabaseKind;
use crate::error::{ApiError, PerformanceError, api_error};

use axum::extract::Query;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

fn parse_database(name: &str) -> Result<DatabaseKind, ApiError> {
    DatabaseKind::from_name(name)
        .ok_or_else(|| PerformanceError::UnknownDatabase(name.to_string()).into())
}

pub async fn handle_run_performance(
    Extension(runner): Extension<Arc<PerformanceRunner>>,
    payload: Result<Json<PerformanceTestConfig>, JsonRejection>,
) -> Result<Json<PerformanceTestResult>, ApiError> {
    let Json(config) = payload.map_err(|e| {
        tracing::warn!("Rejected performance request: {}", e);
        api_error(StatusCode::BAD_REQUEST, e.body_text())
    })?;

    match runner.run(config).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::warn!("Performance run rejected: {}", e);
            Err(e.into())
        }
    }
}

pub async fn handle_cleanup(
    Extension(runner): Extension<Arc<PerformanceRunner>>,
) -> Json<CleanupResponse> {
    runner.cleanup().await;
    Json(CleanupResponse {
        status: "Cleaned successfully".to_string(),
    })
}

pub async fn handle_test_latency(
    Extension(runner): Extension<Arc<PerformanceRunner>>,
    Query(params): Query<DatabaseParams>,
) -> Result<Json<LatencyResponse>, ApiError> {
    let database = parse_database(&params.db)?;
    let check = runner.measure_latency(database).await;

    Ok(Json(LatencyResponse {
        db: database.to_string(),
        latency: check.latency,
        status: if check.success { "success" } else { "failed" }.to_string(),
        error: check.error,
    }))
}

pub async fn handle_request_stats(
    Extension(stats): Extension<Arc<RequestStats>>,
    Query(params): Query<DatabaseParams>,
) -> Result<Json<RequestStatsResponse>, ApiError> {
    let database = parse_database(&params.db)?;
    let snapshot = stats.take(database);

    Ok(Json(RequestStatsResponse {
        db: database.to_string(),
        throughput: snapshot.throughput,
        avg_latency_ms: snapshot.avg_latency_ms,
    }))
}
