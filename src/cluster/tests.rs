//! Cluster Module Tests
//!
//! ## Test Scopes
//! - **Member Registry**: Registration, lookup and per-database listing.
//! - **Inspect Parsing**: Uptime derived from `docker inspect` output.
//! - **Handlers**: Container uptimes and cluster status.

#[cfg(test)]
mod tests {
    use crate::cluster::handlers::{
        UptimeParams, handle_cluster_status, handle_container_uptimes, parse_names,
    };
    use crate::cluster::process::{ProcessControl, parse_inspect_output};
    use crate::cluster::types::{DatabaseKind, MemberRegistry, MemberUptime};
    use crate::error::ProcessControlError;
    use crate::probe::handle::DatabaseHandles;
    use crate::testing::{FakeDatabase, RecordingProcessControl};

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::{Extension, Json};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    // ============================================================
    // MEMBER REGISTRY
    // ============================================================

    #[test]
    fn test_registry_from_names_assigns_databases() {
        let registry = MemberRegistry::from_names(
            &["mongo2".to_string(), "mongo1".to_string()],
            &["cassandra1".to_string(), " ".to_string()],
        );

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("mongo1").unwrap().database, DatabaseKind::Mongo);
        assert_eq!(
            registry.get("cassandra1").unwrap().database,
            DatabaseKind::Cassandra
        );
        assert!(!registry.contains("redis1"));
        assert_eq!(registry.names(), vec!["cassandra1", "mongo1", "mongo2"]);

        let mongo: Vec<String> = registry
            .members_of(DatabaseKind::Mongo)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(mongo, vec!["mongo1", "mongo2"]);
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = MemberRegistry::new();
        assert!(registry.is_empty());

        registry.register("cassandra3", DatabaseKind::Cassandra);
        assert!(registry.contains("cassandra3"));
    }

    // ============================================================
    // INSPECT PARSING
    // ============================================================

    #[test]
    fn test_parse_inspect_output_computes_uptime() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let uptime = parse_inspect_output("2024-05-01T09:30:00Z|running", now).unwrap();

        assert_eq!(
            uptime,
            MemberUptime::Known {
                seconds: 9000,
                hours: 2.5,
                status: "running".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_inspect_output_clamps_unstarted_container() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let uptime = parse_inspect_output("2024-05-02T00:00:00Z|created", now).unwrap();

        assert!(matches!(uptime, MemberUptime::Known { seconds: 0, .. }));
    }

    #[test]
    fn test_parse_inspect_output_rejects_garbage() {
        let now = Utc::now();

        assert!(matches!(
            parse_inspect_output("no separator", now),
            Err(ProcessControlError::Parse(_))
        ));
        assert!(matches!(
            parse_inspect_output("yesterday|running", now),
            Err(ProcessControlError::Parse(_))
        ));
    }

    // ============================================================
    // HANDLERS
    // ============================================================

    #[test]
    fn test_parse_names_drops_blanks() {
        assert_eq!(parse_names(Some("mongo1, ,cassandra2,")), vec!["mongo1", "cassandra2"]);
        assert!(parse_names(None).is_empty());
    }

    #[tokio::test]
    async fn test_container_uptimes_requires_names() {
        let control = RecordingProcessControl::new();
        let shared: Arc<dyn ProcessControl> = control.clone();

        let (status, _) = handle_container_uptimes(
            Extension(shared),
            Query(UptimeParams {
                names: Some(" , ".to_string()),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(control.calls().is_empty());
    }

    #[tokio::test]
    async fn test_container_uptimes_reports_each_member() {
        // ARRANGE
        let control = RecordingProcessControl::new();
        let shared: Arc<dyn ProcessControl> = control.clone();

        // ACT
        let Json(body) = handle_container_uptimes(
            Extension(shared),
            Query(UptimeParams {
                names: Some("mongo1,cassandra1".to_string()),
            }),
        )
        .await
        .unwrap();

        // ASSERT
        assert_eq!(body.uptimes.len(), 2);
        assert!(matches!(
            body.uptimes["mongo1"],
            MemberUptime::Known { seconds: 7200, .. }
        ));
        assert_eq!(control.calls(), vec!["uptime:mongo1", "uptime:cassandra1"]);
    }

    #[tokio::test]
    async fn test_container_uptimes_folds_lookup_errors() {
        let control = RecordingProcessControl::new();
        control.fail_on("uptime");
        let shared: Arc<dyn ProcessControl> = control;

        let Json(body) = handle_container_uptimes(
            Extension(shared),
            Query(UptimeParams {
                names: Some("ghost".to_string()),
            }),
        )
        .await
        .unwrap();

        match &body.uptimes["ghost"] {
            MemberUptime::Error { error } => assert!(error.contains("injected failure")),
            other => panic!("expected an error entry, got {:?}", other),
        }

        let json = serde_json::to_value(&body).unwrap();
        assert!(json["uptimes"]["ghost"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_cluster_status_reports_unreachable_database() {
        let mongo = FakeDatabase::new(DatabaseKind::Mongo);
        let cassandra = FakeDatabase::new(DatabaseKind::Cassandra);
        mongo.set_down(true);
        let handles = DatabaseHandles {
            mongo: mongo.clone(),
            cassandra: cassandra.clone(),
        };
        let registry = MemberRegistry::from_names(&["mongo1".to_string()], &["cassandra1".to_string()]);

        let Json(status) = handle_cluster_status(Extension(handles), Extension(registry)).await;

        assert_eq!(status.mongo["status"], "error");
        assert!(status.mongo["message"].as_str().unwrap().contains("unreachable"));
        assert_eq!(status.cassandra["ok"], 1);
        assert_eq!(status.members.len(), 2);
        assert_eq!(status.members[0].name, "mongo1");
    }
}
