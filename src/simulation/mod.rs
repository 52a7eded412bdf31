//! Failure Simulation Module
//!
//! Disrupts one cluster member, measures both databases while the disruption is
//! in place, reverts it and reports downtime and recovery.
//!
//! ## Run Lifecycle
//! 1. **Injecting**: the request is validated against the member registry, the
//!    process-wide lease is taken and the disruption applied.
//! 2. **Sampling**: both databases are probed once per tick for the window.
//! 3. **Reverting**: the disruption is undone (best effort) and the lease released.
//! 4. **Recovering**: a short post-revert window measures how fast both databases
//!    answer again.
//! 5. **Analyzed**: the series are reduced into a summary and a recovery curve.
//!
//! ## Submodules
//! - **`injector`**: Applies and reverts disruptions through the process controller.
//! - **`sampler`**: The tick loop and its stop signal.
//! - **`analyzer`**: Downtime, data-loss, recovery-time and curve computation.
//! - **`engine`**: Orchestrates the lifecycle and exposes status/stop.
//! - **`lease`**: The exclusive guard ensuring one disruption at a time.
//! - **`handlers`** / **`protocol`**: HTTP surface.

pub mod analyzer;
pub mod engine;
pub mod handlers;
pub mod injector;
pub mod lease;
pub mod protocol;
pub mod sampler;
pub mod types;
