//! Error Taxonomy
//!
//! Validation and conflict errors are raised before any side effect and map to
//! 4xx responses. Process-control failures either abort a run (during injection)
//! or are logged and swallowed (during revert). Probe failures are not errors at
//! all; they are recorded as samples.

use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("unknown target node '{0}'")]
    UnknownTarget(String),

    #[error("duration must be between 1 and {max} seconds, got {got}")]
    InvalidDuration { got: u64, max: u64 },

    #[error("a failure simulation is already running")]
    AlreadyRunning,

    #[error("no failure simulation is running")]
    NotRunning,

    #[error("failed to apply {effect} to '{member}': {source}")]
    Injection {
        effect: String,
        member: String,
        #[source]
        source: ProcessControlError,
    },
}

impl SimulationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SimulationError::UnknownTarget(_) | SimulationError::InvalidDuration { .. } => {
                StatusCode::BAD_REQUEST
            }
            SimulationError::AlreadyRunning => StatusCode::CONFLICT,
            SimulationError::NotRunning => StatusCode::NOT_FOUND,
            SimulationError::Injection { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessControlError {
    /// The controller cannot express this fault for the member.
    #[error("fault not supported by process controller: {0}")]
    Unsupported(String),

    #[error("command `{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unexpected controller output: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report '{0}' not found")]
    NotFound(String),

    #[error("invalid report name '{0}'")]
    InvalidName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReportError::NotFound(_) => StatusCode::NOT_FOUND,
            ReportError::InvalidName(_) => StatusCode::BAD_REQUEST,
            ReportError::Io(_) | ReportError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum PerformanceError {
    #[error("invalid performance test config: {0}")]
    InvalidConfig(String),

    #[error("a performance test is already running")]
    AlreadyRunning,

    #[error("unknown database '{0}', expected mongo or cassandra")]
    UnknownDatabase(String),
}

impl PerformanceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PerformanceError::InvalidConfig(_) | PerformanceError::UnknownDatabase(_) => {
                StatusCode::BAD_REQUEST
            }
            PerformanceError::AlreadyRunning => StatusCode::CONFLICT,
        }
    }
}

/// Body of every non-2xx response from the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}

impl From<SimulationError> for ApiError {
    fn from(err: SimulationError) -> Self {
        api_error(err.status_code(), err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        api_error(err.status_code(), err.to_string())
    }
}

impl From<PerformanceError> for ApiError {
    fn from(err: PerformanceError) -> Self {
        api_error(err.status_code(), err.to_string())
    }
}
