//! Observability layer.
//!
//! Canonical structured event names and field keys/formatters shared by the
//! registry, batching, dispatch, and engine modules. Library code emits
//! `tracing` events against these constants and never installs a global
//! subscriber; binaries and tests own one-time subscriber initialization.

pub mod events;
pub mod fields;
