use super::engine::{SimulationEngine, SimulationReport, SimulationStatus};
use super::protocol::{HealthResponse, StopResponse};
use super::types::FailureConfig;
use crate::error::{ApiError, api_error};

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

pub async fn handle_simulate(
    Extension(engine): Extension<Arc<SimulationEngine>>,
    payload: Result<Json<FailureConfig>, JsonRejection>,
) -> Result<Json<SimulationReport>, ApiError> {
    let Json(config) = payload.map_err(|e| {
        tracing::warn!("Rejected simulation request: {}", e);
        api_error(StatusCode::BAD_REQUEST, e.body_text())
    })?;

    // The run lives in its own task so a dropped connection cannot leave a
    // member disrupted without a revert.
    let run = tokio::spawn(async move { engine.simulate(config).await });

    match run.await {
        Ok(Ok(report)) => Ok(Json(report)),
        Ok(Err(e)) => {
            tracing::warn!("Simulation rejected: {}", e);
            Err(e.into())
        }
        Err(e) => {
            tracing::error!("Simulation task failed: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failure simulation failed: {}", e),
            ))
        }
    }
}

pub async fn handle_stop(
    Extension(engine): Extension<Arc<SimulationEngine>>,
) -> Result<Json<StopResponse>, ApiError> {
    let simulation_id = engine.stop()?;
    Ok(Json(StopResponse {
        message: "Stop signal accepted; the simulation will revert at its next tick".to_string(),
        simulation_id,
    }))
}

pub async fn handle_status(
    Extension(engine): Extension<Arc<SimulationEngine>>,
) -> Json<SimulationStatus> {
    Json(engine.status())
}

pub async fn handle_health(
    Extension(engine): Extension<Arc<SimulationEngine>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        simulation_running: engine.status().running,
    })
}
