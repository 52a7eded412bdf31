use super::store::ReportStore;
use crate::error::{ApiError, api_error};

use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct LatestReportResponse {
    pub latest_report: String,
}

pub async fn handle_list_reports(
    Extension(store): Extension<Arc<dyn ReportStore>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(store.list().await?))
}

pub async fn handle_latest_report(
    Extension(store): Extension<Arc<dyn ReportStore>>,
) -> Result<Json<LatestReportResponse>, ApiError> {
    match store.latest().await? {
        Some(latest_report) => Ok(Json(LatestReportResponse { latest_report })),
        None => Err(api_error(StatusCode::NOT_FOUND, "No reports found.")),
    }
}

pub async fn handle_get_report(
    Extension(store): Extension<Arc<dyn ReportStore>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = store.read(&filename).await?;

    let content_type = if filename.ends_with(".json") {
        "application/json"
    } else if filename.ends_with(".md") {
        "text/markdown; charset=utf-8"
    } else {
        "application/octet-stream"
    };

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
