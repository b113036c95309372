/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Canonical structured field keys and value-format helpers.

use crate::envelope::Batch;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const ENGINE_ID: &str = "engine_id";
pub const WORKER_THREAD: &str = "worker_thread";

pub const PUBSUB_SOURCE: &str = "pubsub_source";
pub const TOPIC: &str = "topic";
pub const ROUTE: &str = "route";
pub const ENTRY_ID: &str = "entry_id";
pub const BATCH_SIZE: &str = "batch_size";
pub const OUTCOME: &str = "outcome";
pub const PRIORITY: &str = "priority";
pub const GENERATION: &str = "generation";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_QUEUE_CLOSED: &str = "queue_closed";
pub const DEFAULT_WORKER_THREAD: &str = "unknown-thread";

/// Correlation context attached to flush-loop and dispatch log events.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkerContext {
    pub engine_id: String,
    pub worker_thread: String,
}

impl WorkerContext {
    pub fn new(engine_id: impl Into<String>, worker_thread: Option<&str>) -> Self {
        Self {
            engine_id: engine_id.into(),
            worker_thread: thread_name_or_default(worker_thread),
        }
    }

    pub fn with_current_thread(engine_id: impl Into<String>) -> Self {
        Self {
            engine_id: engine_id.into(),
            worker_thread: current_thread_name_or_default(),
        }
    }
}

pub fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_WORKER_THREAD).to_string()
}

pub fn current_thread_name_or_default() -> String {
    thread_name_or_default(std::thread::current().name())
}

/// Compact `source/topic` label for one batch, stable across log sites.
pub fn format_batch_label(batch: &Batch) -> String {
    format_topic_label(batch.pubsub_source(), batch.topic())
}

pub fn format_topic_label(pubsub_source: &str, topic: &str) -> String {
    format!("{pubsub_source}/{topic}")
}

#[cfg(test)]
mod tests {
    use super::{
        format_batch_label, format_topic_label, thread_name_or_default, DEFAULT_WORKER_THREAD,
    };
    use crate::envelope::Batch;

    #[test]
    fn topic_label_is_compact_source_slash_topic() {
        assert_eq!(format_topic_label("messagebus", "orders"), "messagebus/orders");
    }

    #[test]
    fn batch_label_uses_batch_identity() {
        let batch = Batch::new("messagebus", "orders", vec![]);
        assert_eq!(format_batch_label(&batch), "messagebus/orders");
    }

    #[test]
    fn thread_name_or_default_falls_back_when_absent() {
        assert_eq!(thread_name_or_default(None), DEFAULT_WORKER_THREAD);
        assert_eq!(thread_name_or_default(Some("named-thread")), "named-thread");
    }
}
