//! Canonical structured event names used across `pubsub-delivery`.

// Registry events.
pub const REGISTRY_RULE_REGISTERED: &str = "registry_rule_registered";
pub const REGISTRY_RULE_REJECTED: &str = "registry_rule_rejected";
pub const REGISTRY_RESOLVE_MISS: &str = "registry_resolve_miss";

// Batcher events.
pub const BATCH_OPEN: &str = "batch_open";
pub const BATCH_APPEND: &str = "batch_append";
pub const BATCH_FLUSH_COUNT: &str = "batch_flush_count";
pub const BATCH_FLUSH_TIMER: &str = "batch_flush_timer";
pub const BATCH_FLUSH_STALE_TIMER: &str = "batch_flush_stale_timer";
pub const BATCH_QUEUE_SEND_FAILED: &str = "batch_queue_send_failed";

// Dispatcher events.
pub const DISPATCH_START: &str = "dispatch_start";
pub const DISPATCH_COMPLETE: &str = "dispatch_complete";
pub const DISPATCH_ENTRY_DROP_UNROUTED: &str = "dispatch_entry_drop_unrouted";
pub const DISPATCH_ENTRY_HANDLER_FAILED: &str = "dispatch_entry_handler_failed";
pub const DISPATCH_ENTRY_HANDLER_PANICKED: &str = "dispatch_entry_handler_panicked";
pub const DISPATCH_DEADLINE_EXPIRED: &str = "dispatch_deadline_expired";

// Aggregator events.
pub const AGGREGATE_MISSING_OUTCOME: &str = "aggregate_missing_outcome";

// Engine lifecycle events.
pub const ENGINE_STARTED: &str = "engine_started";
pub const ENGINE_FLUSH_LOOP_STOPPED: &str = "engine_flush_loop_stopped";
pub const ENGINE_RESPONSE_DELIVERED: &str = "engine_response_delivered";
