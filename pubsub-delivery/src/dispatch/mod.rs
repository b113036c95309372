//! Dispatch layer.
//!
//! Owns per-batch rule resolution, bounded-concurrency handler invocation,
//! and ordered response assembly. Per-entry runtime failures are absorbed
//! into the outcome model here; nothing in this layer propagates a handler
//! error upward.

pub mod aggregator;
pub mod dispatcher;
