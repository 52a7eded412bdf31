//! Cluster Probe Module
//!
//! Measures reachability and latency of the two databases one operation at a time.
//!
//! ## Submodules
//! - **`handle`**: The `DatabaseHandle` seam and its HTTP implementation talking to the data services.
//! - **`probe`**: Bounded-timeout execution of a single operation, producing a `ProbeOutcome`.
//! - **`types`**: Probe kinds, outcomes and per-database samples.

pub mod handle;
pub mod probe;
pub mod types;
