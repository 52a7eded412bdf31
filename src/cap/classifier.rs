//! CAP Classifier
//!
//! Maps static replication settings to qualitative Consistency / Availability /
//! Partition-tolerance bands. The scores are illustrative, derived from
//! configuration only, and never reflect live measurements.

use super::types::{CapAnalysis, CapDimension, CapProfile, Topology};
use crate::cluster::types::DatabaseKind;

pub const ILLUSTRATIVE_NOTE: &str =
    "Scores are illustrative bands derived from static configuration, not measured values.";

pub fn classify(topology: &Topology) -> CapAnalysis {
    CapAnalysis {
        mongodb: classify_replica_set(topology.replica_set_size, &topology.write_concern),
        cassandra: classify_ring(topology.replication_factor, &topology.consistency_level),
        note: ILLUSTRATIVE_NOTE.to_string(),
    }
}

/// Primary-based replica set: writes go through one elected primary.
pub fn classify_replica_set(members: u32, write_concern: &str) -> CapProfile {
    let majority = members / 2 + 1;
    let acknowledged = match write_concern.trim().to_ascii_lowercase().as_str() {
        "majority" => majority,
        other => other.parse::<u32>().unwrap_or(1),
    };

    let consistency = if acknowledged >= majority {
        CapDimension::new("Strong", "ACID transactions with replica set consistency", 90)
    } else {
        CapDimension::new(
            "Moderate",
            "Writes acknowledged by fewer than a majority may roll back on failover",
            65,
        )
    };

    let (availability, partition_tolerance) = match members {
        0 | 1 => (
            CapDimension::new("Low", "Single member, no automatic failover", 30),
            CapDimension::new("Low", "A partition isolates the only member", 20),
        ),
        2 => (
            CapDimension::new("Moderate", "Losing either member prevents a new election", 55),
            CapDimension::new("Limited", "Neither side of a split holds a majority", 50),
        ),
        _ => (
            CapDimension::new("High", "Automatic failover with replica sets", 75),
            CapDimension::new("High", "Handles network partitions with replica sets", 85),
        ),
    };

    CapProfile {
        database: DatabaseKind::Mongo,
        consistency,
        availability,
        partition_tolerance,
        cap_classification: "CP".to_string(),
        basis: format!("{} members, write concern {}", members, write_concern),
    }
}

/// Replicas that must answer for the given consistency level.
pub fn required_replicas(consistency_level: &str, replication_factor: u32) -> u32 {
    let quorum = replication_factor / 2 + 1;
    let required = match consistency_level.trim().to_ascii_uppercase().as_str() {
        "ANY" | "ONE" | "LOCAL_ONE" => 1,
        "TWO" => 2,
        "THREE" => 3,
        "QUORUM" | "LOCAL_QUORUM" | "EACH_QUORUM" => quorum,
        "ALL" => replication_factor,
        _ => 1,
    };
    required.min(replication_factor.max(1))
}

/// Masterless ring with tunable consistency.
pub fn classify_ring(replication_factor: u32, consistency_level: &str) -> CapProfile {
    let required = required_replicas(consistency_level, replication_factor);
    let overlapping = 2 * required > replication_factor;
    let tolerated = replication_factor.saturating_sub(required);

    let consistency = if overlapping {
        CapDimension::new(
            "Strong (tunable)",
            "Reads and writes at this level overlap on at least one replica",
            85,
        )
    } else {
        CapDimension::new("Tunable", "Configurable consistency levels", 60)
    };

    let availability = match tolerated {
        0 => CapDimension::new("Moderate", "Every replica must respond", 55),
        1 => CapDimension::new("High", "Tolerates one replica failure per token range", 80),
        _ => CapDimension::new("Very High", "No single point of failure", 95),
    };

    let partition_tolerance = match replication_factor {
        0 | 1 => CapDimension::new("Limited", "Each token range lives on a single node", 50),
        2 => CapDimension::new("High", "Either replica can serve a split token range", 80),
        _ => CapDimension::new("Very High", "Designed for network partitions", 95),
    };

    CapProfile {
        database: DatabaseKind::Cassandra,
        consistency,
        availability,
        partition_tolerance,
        cap_classification: if overlapping { "CP" } else { "AP" }.to_string(),
        basis: format!(
            "replication factor {}, consistency level {}",
            replication_factor, consistency_level
        ),
    }
}
