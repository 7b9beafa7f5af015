//! Liveness sweeping
//!
//! Probes every connection on a fixed interval and evicts the ones that
//! did not answer the previous probe.

mod sweeper;

pub use sweeper::{HeartbeatSweeper, SweepReport};
