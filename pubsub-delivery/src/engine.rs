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

//! Outward engine facade wiring registry, batcher, dispatcher, and the
//! caller-provided response sink together.

use crate::batching::batcher::TopicBatcher;
use crate::config::SubscriptionSettings;
use crate::dispatch::dispatcher::Dispatcher;
use crate::envelope::{Batch, BulkResponse, Message, Outcome};
use crate::observability::{events, fields};
use crate::registry::rule::{MessageHandler, SubscriptionRule};
use crate::registry::topic_registry::{RegistrationError, RegistrationId, TopicRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

const COMPONENT: &str = "delivery_engine";

/// Receiver for responses produced by batcher-driven (asynchronous) flushes.
///
/// The transport implements this to acknowledge or redeliver entries upstream.
#[async_trait]
pub trait BulkResponseSink: Send + Sync {
    async fn on_response(&self, pubsub_source: &str, topic: &str, response: BulkResponse);
}

/// The bulk-aware delivery engine.
///
/// Two request styles coexist: `submit_single` / `submit_bulk` are synchronous
/// request paths that return outcomes to the caller, while `offer` feeds the
/// per-topic batcher and delivers flush responses to the registered
/// [`BulkResponseSink`].
pub struct DeliveryEngine {
    name: String,
    engine_id: String,
    registry: Arc<TopicRegistry>,
    dispatcher: Arc<Dispatcher>,
    batcher: Arc<TopicBatcher>,
}

impl DeliveryEngine {
    /// Creates an engine and starts its flush-consumer loop.
    ///
    /// `flush_queue_size` bounds the number of flushed batches awaiting
    /// dispatch; `max_dispatch_concurrency` bounds concurrent handler
    /// invocations within one batch.
    pub fn new(
        name: &str,
        flush_queue_size: u16,
        max_dispatch_concurrency: usize,
        response_sink: Arc<dyn BulkResponseSink>,
    ) -> Self {
        let engine_id = Uuid::new_v4().to_string();
        let registry = Arc::new(TopicRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(registry.clone(), max_dispatch_concurrency));

        let (flush_tx, flush_rx) = mpsc::channel(usize::from(flush_queue_size.max(1)));
        let batcher = Arc::new(TopicBatcher::new(registry.clone(), flush_tx));

        tokio::spawn(Self::flush_loop(
            engine_id.clone(),
            dispatcher.clone(),
            response_sink,
            flush_rx,
        ));

        tracing::info!(
            event = events::ENGINE_STARTED,
            component = COMPONENT,
            engine_id = engine_id.as_str(),
            name,
            flush_queue_size,
            max_dispatch_concurrency,
            "delivery engine started"
        );

        Self {
            name: name.to_string(),
            engine_id,
            registry,
            dispatcher,
            batcher,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a fully built rule.
    pub fn register(&self, rule: SubscriptionRule) -> Result<RegistrationId, RegistrationError> {
        self.registry.register(rule)
    }

    /// Registers a subscription from declared settings, compiling the match
    /// expression and deriving bulk bounds up front.
    pub fn register_with_settings(
        &self,
        pubsub_source: &str,
        topic: &str,
        route: &str,
        settings: &SubscriptionSettings,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<RegistrationId, RegistrationError> {
        let rule = SubscriptionRule::from_settings(pubsub_source, topic, route, settings, handler)?;
        self.registry.register(rule)
    }

    /// Synchronous non-bulk entry point: dispatches one message and returns
    /// its outcome.
    pub async fn submit_single(
        &self,
        pubsub_source: &str,
        topic: &str,
        message: Message,
    ) -> Outcome {
        let entry_id = message.entry_id().to_string();
        let batch = Batch::new(pubsub_source, topic, vec![message]);
        let response = self.dispatcher.dispatch(batch).await;
        response.outcome_of(&entry_id).unwrap_or(Outcome::Retry)
    }

    /// Synchronous bulk entry point: dispatches a transport-assembled batch.
    pub async fn submit_bulk(
        &self,
        pubsub_source: &str,
        topic: &str,
        messages: Vec<Message>,
    ) -> BulkResponse {
        self.submit_bulk_with_deadline(pubsub_source, topic, messages, None)
            .await
    }

    /// Bulk entry point bounding total handler time; entries unresolved at the
    /// deadline are reported as `Retry`.
    pub async fn submit_bulk_with_deadline(
        &self,
        pubsub_source: &str,
        topic: &str,
        messages: Vec<Message>,
        deadline: Option<Duration>,
    ) -> BulkResponse {
        if messages.is_empty() {
            return BulkResponse::empty();
        }
        let batch = Batch::new(pubsub_source, topic, messages);
        self.dispatcher.dispatch_with_deadline(batch, deadline).await
    }

    /// Feeds one message into the batcher; the flush response reaches the
    /// registered sink once the batch's bounds are hit.
    pub async fn offer(&self, pubsub_source: &str, topic: &str, message: Message) {
        self.batcher.offer(pubsub_source, topic, message).await;
    }

    /// Explicitly flushes the in-progress batch for a topic and returns its
    /// response to the caller. An untouched topic yields an empty response
    /// without invoking the dispatcher.
    pub async fn flush_topic(&self, pubsub_source: &str, topic: &str) -> BulkResponse {
        match self.batcher.take_pending(pubsub_source, topic).await {
            Some(batch) => self.dispatcher.dispatch(batch).await,
            None => BulkResponse::empty(),
        }
    }

    async fn flush_loop(
        engine_id: String,
        dispatcher: Arc<Dispatcher>,
        response_sink: Arc<dyn BulkResponseSink>,
        mut flush_rx: mpsc::Receiver<Batch>,
    ) {
        let worker_context = fields::WorkerContext::with_current_thread(engine_id);

        while let Some(batch) = flush_rx.recv().await {
            let pubsub_source = batch.pubsub_source().to_string();
            let topic = batch.topic().to_string();
            let topic_label = fields::format_batch_label(&batch);
            let batch_size = batch.len();

            let response = dispatcher.dispatch(batch).await;

            tracing::debug!(
                event = events::ENGINE_RESPONSE_DELIVERED,
                component = COMPONENT,
                engine_id = worker_context.engine_id.as_str(),
                worker_thread = worker_context.worker_thread.as_str(),
                topic_label = topic_label.as_str(),
                batch_size,
                "delivering flush response to sink"
            );
            response_sink
                .on_response(&pubsub_source, &topic, response)
                .await;
        }

        tracing::info!(
            event = events::ENGINE_FLUSH_LOOP_STOPPED,
            component = COMPONENT,
            engine_id = worker_context.engine_id.as_str(),
            worker_thread = worker_context.worker_thread.as_str(),
            reason = fields::REASON_QUEUE_CLOSED,
            "flush queue closed; stopping flush loop"
        );
    }
}

impl std::fmt::Debug for DeliveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("name", &self.name)
            .field("engine_id", &self.engine_id)
            .finish()
    }
}
