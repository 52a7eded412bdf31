//! Report Persistence
//!
//! Named report blobs under a single directory. Names are flat (no path
//! separators) and written once; the store never rewrites an existing report.

use crate::error::ReportError;
use crate::performance::types::PerformanceTestResult;
use crate::simulation::types::SimulationResult;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn write(&self, name: &str, contents: &[u8]) -> Result<(), ReportError>;

    async fn read(&self, name: &str) -> Result<Vec<u8>, ReportError>;

    /// Report names, newest first.
    async fn list(&self) -> Result<Vec<String>, ReportError>;

    /// Most recently written report, if any.
    async fn latest(&self) -> Result<Option<String>, ReportError>;
}

/// Rejects anything that could escape the report directory.
pub fn validate_name(name: &str) -> Result<(), ReportError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(ReportError::InvalidName(name.to_string()))
    }
}

pub struct FsReportStore {
    dir: PathBuf,
}

impl FsReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn entries(&self) -> Result<Vec<(String, SystemTime)>, ReportError> {
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((entry.file_name().to_string_lossy().to_string(), modified));
        }
        Ok(entries)
    }
}

#[async_trait]
impl ReportStore for FsReportStore {
    async fn write(&self, name: &str, contents: &[u8]) -> Result<(), ReportError> {
        validate_name(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(name);
        tokio::fs::write(&path, contents).await?;
        tracing::info!("Report saved at {}", path.display());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, ReportError> {
        validate_name(name)?;
        match tokio::fs::read(self.dir.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ReportError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>, ReportError> {
        let mut names: Vec<String> = self.entries().await?.into_iter().map(|(n, _)| n).collect();
        names.sort_by(|a, b| b.cmp(a));
        Ok(names)
    }

    async fn latest(&self) -> Result<Option<String>, ReportError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(name, _)| name))
    }
}

/// Base name for a run's reports: `failure_<YYYYmmdd_HHMMSS>_<id prefix>`.
pub fn report_stem(result: &SimulationResult) -> String {
    let id: String = result.summary.simulation_id.chars().take(8).collect();
    format!(
        "failure_{}_{}",
        result.summary.finished_at.format("%Y%m%d_%H%M%S"),
        id
    )
}

/// Writes the JSON and Markdown renderings of a run. Returns the names written.
pub async fn persist_simulation(
    store: &dyn ReportStore,
    result: &SimulationResult,
) -> Result<Vec<String>, ReportError> {
    let stem = report_stem(result);
    let json_name = format!("{}.json", stem);
    let md_name = format!("{}.md", stem);

    store
        .write(&json_name, &serde_json::to_vec_pretty(result)?)
        .await?;
    store
        .write(&md_name, render_markdown(result).as_bytes())
        .await?;

    Ok(vec![json_name, md_name])
}

fn outcome_cell(success: bool, latency: Option<f64>) -> String {
    match (success, latency) {
        (true, Some(ms)) => format!("ok ({:.1} ms)", ms),
        (true, None) => "ok".to_string(),
        (false, _) => "FAIL".to_string(),
    }
}

pub fn render_markdown(result: &SimulationResult) -> String {
    let s = &result.summary;
    let mut out = String::new();

    out.push_str(&format!(
        "# Failure Simulation Report ({})\n\n",
        s.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str("## Summary\n");
    out.push_str(&format!("- **failureType**: {}\n", s.failure_type));
    out.push_str(&format!("- **targetNode**: {}\n", s.target_node));
    out.push_str(&format!("- **duration**: {}s\n", s.duration));
    out.push_str(&format!("- **mode**: {}\n", s.mode));
    out.push_str(&format!(
        "- **mongodbDowntime**: {:.1}s\n",
        s.mongodb_downtime_seconds
    ));
    out.push_str(&format!(
        "- **cassandraDowntime**: {:.1}s\n",
        s.cassandra_downtime_seconds
    ));
    out.push_str(&format!("- **dataLossMongo**: {}\n", s.data_loss_mongo));
    out.push_str(&format!("- **dataLossCassandra**: {}\n", s.data_loss_cassandra));
    out.push_str(&format!(
        "- **recoveryTime**: {:.1}s{}\n",
        s.recovery_time_seconds,
        if s.recovered { "" } else { " (not observed)" }
    ));

    out.push_str("\n## Availability\n");
    for point in &result.availability_metrics {
        out.push_str(&format!(
            "- {} | MongoDB: {} | Cassandra: {}\n",
            point.time,
            outcome_cell(point.mongo.success, point.mongo.latency),
            outcome_cell(point.cassandra.success, point.cassandra.latency),
        ));
    }

    out.push_str("\n## Recovery\n");
    for point in &result.recovery_metrics {
        out.push_str(&format!(
            "- {} | MongoDB: {:.0}% | Cassandra: {:.0}%\n",
            point.time, point.mongo_recovery_percent, point.cassandra_recovery_percent
        ));
    }

    out
}

/// Base name for a performance run: `performance_<YYYYmmdd_HHMMSS>_<id prefix>`.
pub fn performance_report_stem(result: &PerformanceTestResult) -> String {
    let id: String = result.summary.run_id.chars().take(8).collect();
    format!(
        "performance_{}_{}",
        result.summary.finished_at.format("%Y%m%d_%H%M%S"),
        id
    )
}

pub async fn persist_performance(
    store: &dyn ReportStore,
    result: &PerformanceTestResult,
) -> Result<Vec<String>, ReportError> {
    let stem = performance_report_stem(result);
    let json_name = format!("{}.json", stem);
    let md_name = format!("{}.md", stem);

    store
        .write(&json_name, &serde_json::to_vec_pretty(result)?)
        .await?;
    store
        .write(&md_name, render_performance_markdown(result).as_bytes())
        .await?;

    Ok(vec![json_name, md_name])
}

pub fn render_performance_markdown(result: &PerformanceTestResult) -> String {
    let s = &result.summary;
    let mut out = String::new();

    out.push_str(&format!(
        "# Performance Report ({})

",
        s.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str("## Summary
");
    out.push_str(&format!("- **totalOps**: {}
", s.total_ops));
    out.push_str(&format!("- **batchSize**: {}
", s.batch_size));
    out.push_str(&format!("- **testType**: {}
", s.test_type));
    out.push_str(&format!("- **errors**: {}
", s.errors));

    out.push_str("
## Latency Metrics (ms per batch)
");
    for metric in &result.latency_metrics {
        out.push_str(&format!(
            "- {} | MongoDB: {:.2} | Cassandra: {:.2}
",
            metric.operation, metric.mongodb, metric.cassandra
        ));
    }

    out.push_str("
## Throughput Metrics (ops/s)
");
    for metric in &result.throughput_metrics {
        out.push_str(&format!("- {}: {:.2}
", metric.db, metric.throughput));
    }

    out
}
