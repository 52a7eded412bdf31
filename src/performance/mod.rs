//! Performance Testing Module
//!
//! Benchmarks both databases side by side with the same generated workload, and
//! keeps per-database request counters for live dashboards.
//!
//! ## Run Lifecycle
//! 1. **Cleanup**: the performance collection is emptied on both databases.
//! 2. **Workload**: documents are inserted, read and updated in batches against
//!    both databases concurrently; every batch is timed.
//! 3. **Aggregation**: mean batch latency per operation and overall throughput.
//! 4. **Persistence**: the result is saved as JSON and Markdown reports.
//!
//! ## Submodules
//! - **`runner`**: Cleanup, workload execution, latency checks and aggregation.
//! - **`stats`**: Request counters and the metering handle wrapper feeding them.
//! - **`types`**: Test config, per-database results and comparison tables.
//! - **`handlers`** / **`protocol`**: HTTP surface.

pub mod handlers;
pub mod protocol;
pub mod runner;
pub mod stats;
pub mod types;

#[cfg(test)]
mod tests;
