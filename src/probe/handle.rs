//! Database Handles
//!
//! Each database is reached through its data service, a small REST front-end
//! that owns the actual driver. The two services expose the same operations with
//! slightly different parameter names, captured here as a `ServiceDialect`.

use crate::cluster::types::DatabaseKind;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

/// Operations the controller needs from a database.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    fn kind(&self) -> DatabaseKind;

    async fn ping(&self) -> Result<()>;

    async fn find(&self, filter: Value) -> Result<Value>;

    async fn insert(&self, document: Value) -> Result<Value>;

    async fn update(&self, filter: Value, update: Value) -> Result<Value>;

    async fn delete(&self, filter: Value) -> Result<Value>;

    /// Replica-set status (document store) or ring status (wide-column store).
    async fn status(&self) -> Result<Value>;
}

/// Parameter names used by one data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDialect {
    pub health_path: &'static str,
    pub container_param: &'static str,
    pub find_filter_field: &'static str,
    pub update_filter_field: &'static str,
    pub update_values_field: &'static str,
}

impl ServiceDialect {
    pub fn for_kind(kind: DatabaseKind) -> Self {
        match kind {
            DatabaseKind::Mongo => Self {
                health_path: "/ping",
                container_param: "collection",
                find_filter_field: "filter",
                update_filter_field: "filter",
                update_values_field: "update",
            },
            DatabaseKind::Cassandra => Self {
                health_path: "/health",
                container_param: "table",
                find_filter_field: "filters",
                update_filter_field: "filters",
                update_values_field: "updates",
            },
        }
    }
}

/// `DatabaseHandle` backed by a data service over HTTP.
pub struct HttpDatabaseHandle {
    kind: DatabaseKind,
    base_url: String,
    container: String,
    dialect: ServiceDialect,
    client: reqwest::Client,
}

impl HttpDatabaseHandle {
    pub fn new(kind: DatabaseKind, base_url: &str, container: &str) -> Self {
        Self {
            kind,
            base_url: base_url.trim_end_matches('/').to_string(),
            container: container.to_string(),
            dialect: ServiceDialect::for_kind(kind),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json(&self, response: reqwest::Response, op: &str) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "{} {} failed with {}: {}",
                self.kind,
                op,
                status,
                body
            ));
        }
        response
            .json::<Value>()
            .await
            .with_context(|| format!("{} {} returned invalid JSON", self.kind, op))
    }
}

#[async_trait]
impl DatabaseHandle for HttpDatabaseHandle {
    fn kind(&self) -> DatabaseKind {
        self.kind
    }

    async fn ping(&self) -> Result<()> {
        let response = self.client.get(self.url(self.dialect.health_path)).send().await?;
        self.read_json(response, "ping").await.map(|_| ())
    }

    async fn find(&self, filter: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.url("/find"))
            .query(&[(self.dialect.container_param, self.container.as_str())])
            .json(&json!({ self.dialect.find_filter_field: filter }))
            .send()
            .await?;
        self.read_json(response, "find").await
    }

    async fn insert(&self, document: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.url("/insert"))
            .query(&[(self.dialect.container_param, self.container.as_str())])
            .json(&document)
            .send()
            .await?;
        self.read_json(response, "insert").await
    }

    async fn update(&self, filter: Value, update: Value) -> Result<Value> {
        let response = self
            .client
            .put(self.url("/update"))
            .query(&[(self.dialect.container_param, self.container.as_str())])
            .json(&json!({
                self.dialect.update_filter_field: filter,
                self.dialect.update_values_field: update,
            }))
            .send()
            .await?;
        self.read_json(response, "update").await
    }

    async fn delete(&self, filter: Value) -> Result<Value> {
        let response = self
            .client
            .delete(self.url("/delete"))
            .query(&[(self.dialect.container_param, self.container.as_str())])
            .json(&json!({ "filter": filter }))
            .send()
            .await?;
        self.read_json(response, "delete").await
    }

    async fn status(&self) -> Result<Value> {
        let response = self.client.get(self.url("/status")).send().await?;
        self.read_json(response, "status").await
    }
}

/// The pair of handles the controller works with.
#[derive(Clone)]
pub struct DatabaseHandles {
    pub mongo: std::sync::Arc<dyn DatabaseHandle>,
    pub cassandra: std::sync::Arc<dyn DatabaseHandle>,
}
