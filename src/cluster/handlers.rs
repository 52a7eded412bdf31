use super::process::ProcessControl;
use super::types::{Member, MemberRegistry, MemberUptime};
use crate::error::{ApiError, api_error};
use crate::probe::handle::{DatabaseHandle, DatabaseHandles};

use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct UptimeParams {
    pub names: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UptimesResponse {
    pub uptimes: BTreeMap<String, MemberUptime>,
}

#[derive(Debug, Serialize)]
pub struct ClusterStatusResponse {
    pub mongo: Value,
    pub cassandra: Value,
    pub members: Vec<Member>,
}

/// Parses the comma-separated `names` parameter, dropping blanks.
pub fn parse_names(names: Option<&str>) -> Vec<String> {
    names
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn handle_container_uptimes(
    Extension(control): Extension<Arc<dyn ProcessControl>>,
    Query(params): Query<UptimeParams>,
) -> Result<Json<UptimesResponse>, ApiError> {
    let names = parse_names(params.names.as_deref());
    if names.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "No container names provided",
        ));
    }

    let mut uptimes = BTreeMap::new();
    for name in names {
        let uptime = match control.uptime(&name).await {
            Ok(uptime) => uptime,
            Err(e) => {
                tracing::debug!("Uptime lookup for {} failed: {}", name, e);
                MemberUptime::Error {
                    error: e.to_string(),
                }
            }
        };
        uptimes.insert(name, uptime);
    }

    Ok(Json(UptimesResponse { uptimes }))
}

async fn status_or_error(handle: &dyn DatabaseHandle) -> Value {
    match handle.status().await {
        Ok(status) => status,
        Err(e) => json!({ "status": "error", "message": format!("{:#}", e) }),
    }
}

/// Replica-set and ring status, for confirming recovery after a run.
pub async fn handle_cluster_status(
    Extension(handles): Extension<DatabaseHandles>,
    Extension(registry): Extension<Arc<MemberRegistry>>,
) -> Json<ClusterStatusResponse> {
    let (mongo, cassandra) = tokio::join!(
        status_or_error(handles.mongo.as_ref()),
        status_or_error(handles.cassandra.as_ref()),
    );

    let mut members = Vec::with_capacity(registry.len());
    for kind in super::types::DatabaseKind::ALL {
        members.extend(registry.members_of(kind));
    }

    Json(ClusterStatusResponse {
        mongo,
        cassandra,
        members,
    })
}
