//! Cluster Module
//!
//! Knows which database members exist and how to act on them.
//!
//! ## Core Concepts
//! - **Member Registry**: The recognized member names per database. Only these
//!   may be targeted by a failure simulation.
//! - **Process Control**: The seam used to stop, pause, partition or constrain a
//!   member, and to look up its uptime. Production drives the docker CLI.

pub mod handlers;
pub mod process;
pub mod types;

#[cfg(test)]
mod tests;
