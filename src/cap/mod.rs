//! CAP Characterization Module
//!
//! Produces the static Consistency / Availability / Partition-tolerance table
//! shown next to every simulation result. It depends only on configuration,
//! never on simulation data, so repeated calls return identical profiles.

pub mod classifier;
pub mod handlers;
pub mod types;
