//! Report Module
//!
//! Stores each finished simulation or performance run as a pair of JSON and
//! Markdown blobs and serves them back by name.

pub mod handlers;
pub mod store;
