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

use async_trait::async_trait;
use pubsub_delivery::{BulkResponse, BulkResponseSink, HandlerError, Message, MessageHandler};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// One-time tracing initialization for integration tests. Safe to call from
/// every test; later calls are no-ops.
pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Handler that succeeds and counts invocations.
#[derive(Default)]
pub(crate) struct CountingHandler {
    invocations: AtomicUsize,
}

impl CountingHandler {
    #[allow(dead_code)]
    pub(crate) fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MessageHandler for CountingHandler {
    async fn handle(&self, _message: &Message) -> Result<(), HandlerError> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Handler that fails one configured entry and succeeds for the rest.
#[allow(dead_code)]
pub(crate) struct FailingHandler {
    pub(crate) failing_entry: String,
    pub(crate) error: HandlerError,
}

#[async_trait]
impl MessageHandler for FailingHandler {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        if message.entry_id() == self.failing_entry {
            Err(self.error.clone())
        } else {
            Ok(())
        }
    }
}

/// Sink that forwards responses over a channel for test assertions.
pub(crate) struct ChannelSink {
    tx: mpsc::UnboundedSender<(String, String, BulkResponse)>,
}

impl ChannelSink {
    pub(crate) fn pair() -> (
        Self,
        mpsc::UnboundedReceiver<(String, String, BulkResponse)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl BulkResponseSink for ChannelSink {
    async fn on_response(&self, pubsub_source: &str, topic: &str, response: BulkResponse) {
        let _ = self
            .tx
            .send((pubsub_source.to_string(), topic.to_string(), response));
    }
}

/// Sink for tests that only exercise the synchronous submit paths.
#[allow(dead_code)]
pub(crate) struct NullSink;

#[async_trait]
impl BulkResponseSink for NullSink {
    async fn on_response(&self, _pubsub_source: &str, _topic: &str, _response: BulkResponse) {}
}

pub(crate) fn message(entry_id: &str) -> Message {
    Message::new(entry_id, b"{}".to_vec(), "application/json")
}

#[allow(dead_code)]
pub(crate) fn message_with_type(entry_id: &str, event_type: &str) -> Message {
    let mut metadata = HashMap::new();
    metadata.insert("type".to_string(), event_type.to_string());
    Message::with_metadata(entry_id, b"{}".to_vec(), "application/json", metadata)
}
