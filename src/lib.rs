//! Cluster Failure Lab Library
//!
//! This library crate defines the modules behind the failure-injection controller.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! The controller disrupts one member of either a replica-set document store or a
//! peer-to-peer wide-column store, watches both databases while the disruption is
//! in place, reverts it and reports how each one coped.
//!
//! ## Architecture Modules
//! - **`cluster`**: The member registry and the process controller used to stop,
//!   pause, partition or constrain a member.
//! - **`probe`**: Handles to the two data services and the bounded-latency probe
//!   that turns every operation into a success/failure sample.
//! - **`simulation`**: The run lifecycle. Injection, tick sampling, revert,
//!   recovery measurement and analysis, plus the HTTP surface.
//! - **`performance`**: Side-by-side batched workload benchmarks and the request
//!   counters behind the live statistics endpoint.
//! - **`cap`**: The static CAP characterization shown next to every result.
//! - **`reports`**: JSON and Markdown persistence of finished runs.
//! - **`clock`** / **`config`** / **`error`**: Shared plumbing.

pub mod cap;
pub mod clock;
pub mod cluster;
pub mod config;
pub mod error;
pub mod performance;
pub mod probe;
pub mod reports;
pub mod simulation;

#[cfg(test)]
mod testing;
