//! Controller Configuration
//!
//! All knobs come from command-line flags with environment-variable fallbacks,
//! so the same binary runs under docker-compose (env) and locally (flags).

use crate::cap::types::Topology;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "failure-controller", about = "Failure-injection controller for the database comparison cluster")]
pub struct Settings {
    /// Address the HTTP API listens on.
    #[arg(long, env = "CONTROLLER_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Base URL of the document-store data service.
    #[arg(long, env = "MONGO_SERVICE_URL", default_value = "http://localhost:8001/api/mongo")]
    pub mongo_url: String,

    /// Base URL of the wide-column-store data service.
    #[arg(long, env = "CASSANDRA_SERVICE_URL", default_value = "http://localhost:8001/api/cassandra")]
    pub cassandra_url: String,

    #[arg(long, env = "MONGO_MEMBERS", value_delimiter = ',', default_value = "mongo1,mongo2,mongo3")]
    pub mongo_members: Vec<String>,

    #[arg(long, env = "CASSANDRA_MEMBERS", value_delimiter = ',', default_value = "cassandra1,cassandra2,cassandra3")]
    pub cassandra_members: Vec<String>,

    /// Collection / table the probe reads and writes.
    #[arg(long, env = "PROBE_COLLECTION", default_value = "failure_probe")]
    pub probe_collection: String,

    /// Collection / table the performance workload writes to and empties.
    #[arg(long, env = "PERFORMANCE_COLLECTION", default_value = "performance_test")]
    pub performance_collection: String,

    #[arg(long, env = "DOCKER_BIN", default_value = "docker")]
    pub docker_bin: String,

    /// Docker network members are disconnected from during a partition.
    #[arg(long, env = "CLUSTER_NETWORK", default_value = "db-cluster")]
    pub cluster_network: String,

    /// Sampling period. Must be at least 1ms.
    #[arg(long, env = "TICK_INTERVAL_MS", default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_interval_ms: u64,

    #[arg(long, env = "PROBE_TIMEOUT_MS", default_value_t = 3000, value_parser = clap::value_parser!(u64).range(1..))]
    pub probe_timeout_ms: u64,

    #[arg(long, env = "MAX_DURATION_SECS", default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_duration_secs: u64,

    /// Ticks sampled after the disruption is reverted.
    #[arg(long, env = "RECOVERY_TICKS", default_value_t = 10)]
    pub recovery_ticks: u32,

    #[arg(long, env = "REPORT_DIR", default_value = "logs/failure_reports")]
    pub report_dir: PathBuf,

    #[arg(long, env = "PERSIST_REPORTS", default_value_t = true, action = clap::ArgAction::Set)]
    pub persist_reports: bool,

    #[arg(long, env = "MONGO_REPLICA_SET_SIZE", default_value_t = 3)]
    pub mongo_replica_set_size: u32,

    /// Write concern used by the document store ("majority" or a number).
    #[arg(long, env = "MONGO_WRITE_CONCERN", default_value = "majority")]
    pub mongo_write_concern: String,

    #[arg(long, env = "CASSANDRA_REPLICATION_FACTOR", default_value_t = 3)]
    pub cassandra_replication_factor: u32,

    #[arg(long, env = "CASSANDRA_CONSISTENCY", default_value = "ONE")]
    pub cassandra_consistency: String,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,
}

impl Settings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn topology(&self) -> Topology {
        Topology {
            replica_set_size: self.mongo_replica_set_size,
            write_concern: self.mongo_write_concern.clone(),
            replication_factor: self.cassandra_replication_factor,
            consistency_level: self.cassandra_consistency.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_cluster() {
        let settings = Settings::parse_from(["failure-controller"]);

        assert_eq!(settings.mongo_members, vec!["mongo1", "mongo2", "mongo3"]);
        assert_eq!(settings.cassandra_members.len(), 3);
        assert_eq!(settings.tick_interval(), Duration::from_secs(1));
        assert_eq!(settings.max_duration_secs, 300);
        assert_eq!(settings.performance_collection, "performance_test");
        assert!(settings.persist_reports);
        assert_eq!(settings.topology(), Topology::default());
    }

    #[test]
    fn test_member_lists_are_comma_separated() {
        let settings = Settings::parse_from([
            "failure-controller",
            "--mongo-members",
            "rs0,rs1",
            "--persist-reports",
            "false",
        ]);

        assert_eq!(settings.mongo_members, vec!["rs0", "rs1"]);
        assert!(!settings.persist_reports);
    }

    #[test]
    fn test_zero_timings_are_rejected() {
        for flag in ["--tick-interval-ms", "--probe-timeout-ms", "--max-duration-secs"] {
            let parsed = Settings::try_parse_from(["failure-controller", flag, "0"]);
            assert!(parsed.is_err(), "{} accepted 0", flag);
        }

        let settings =
            Settings::try_parse_from(["failure-controller", "--tick-interval-ms", "1"]).unwrap();
        assert_eq!(settings.tick_interval(), Duration::from_millis(1));
    }
}
