//! Lifecycle management for background work.
//!
//! Every background task in this crate (the counter sweeper, the metrics
//! exporter) has an explicit start call and subscribes to the shutdown
//! broadcast. There are no fire-and-forget timers: a test that never calls
//! `start_sweeper` gets a component with no background work at all.

pub mod shutdown;

pub use shutdown::Shutdown;
