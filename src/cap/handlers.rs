use super::classifier::classify;
use super::types::{CapAnalysis, Topology};

use axum::{Extension, Json};
use std::sync::Arc;

pub async fn handle_cap_analysis(
    Extension(topology): Extension<Arc<Topology>>,
) -> Json<CapAnalysis> {
    Json(classify(&topology))
}
