//! Batching layer.
//!
//! Owns per-topic accumulation state and the count/max-await flush bounds.
//! Exactly one flush succeeds per batch generation whether the count bound or
//! the timer fires first; offers to different topics proceed independently.

pub mod batcher;
