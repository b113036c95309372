//! Registry layer.
//!
//! Owns the subscription-rule model, the compile-once match-expression
//! predicate, and the topic registry's dedupe and deterministic-resolution
//! semantics. Registration mutates an atomically swapped snapshot, so live
//! resolution never observes a partially registered rule.

pub mod match_expression;
pub mod rule;
pub mod topic_registry;
