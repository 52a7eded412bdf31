use crate::cluster::types::DatabaseKind;
use serde::{Deserialize, Serialize};

/// Static replication settings the classifier reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    pub replica_set_size: u32,
    /// `"majority"` or a member count.
    pub write_concern: String,
    pub replication_factor: u32,
    /// ONE, TWO, THREE, QUORUM, LOCAL_QUORUM, ALL or ANY.
    pub consistency_level: String,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            replica_set_size: 3,
            write_concern: "majority".to_string(),
            replication_factor: 3,
            consistency_level: "ONE".to_string(),
        }
    }
}

/// One CAP dimension: a qualitative band and an illustrative 0..100 score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapDimension {
    pub level: String,
    pub description: String,
    pub score: u8,
}

impl CapDimension {
    pub fn new(level: &str, description: &str, score: u8) -> Self {
        Self {
            level: level.to_string(),
            description: description.to_string(),
            score: score.min(100),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapProfile {
    pub database: DatabaseKind,
    pub consistency: CapDimension,
    pub availability: CapDimension,
    pub partition_tolerance: CapDimension,
    /// "CP" or "AP".
    pub cap_classification: String,
    /// The configuration the profile was derived from, in words.
    pub basis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapAnalysis {
    pub mongodb: CapProfile,
    pub cassandra: CapProfile,
    pub note: String,
}
