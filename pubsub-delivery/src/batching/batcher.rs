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

//! Per-topic batch accumulation bounded by count and by a max-await timer.

use crate::envelope::{Batch, Message};
use crate::observability::{events, fields};
use crate::registry::rule::BulkConfig;
use crate::registry::topic_registry::TopicRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "topic_batcher";

struct AccumulatorState {
    // Bumped on every flush; an armed timer carrying a stale generation is a
    // lost race and must not flush the successor batch.
    generation: u64,
    messages: Vec<Message>,
    opened_at: Option<Instant>,
}

/// Accumulation state for one (pubsub source, topic) pair.
struct TopicAccumulator {
    pubsub_source: String,
    topic: String,
    bulk: BulkConfig,
    flush_queue: Sender<Batch>,
    state: Mutex<AccumulatorState>,
}

impl TopicAccumulator {
    fn new(pubsub_source: &str, topic: &str, bulk: BulkConfig, flush_queue: Sender<Batch>) -> Self {
        Self {
            pubsub_source: pubsub_source.to_string(),
            topic: topic.to_string(),
            bulk,
            flush_queue,
            state: Mutex::new(AccumulatorState {
                generation: 0,
                messages: Vec::new(),
                opened_at: None,
            }),
        }
    }

    fn topic_label(&self) -> String {
        fields::format_topic_label(&self.pubsub_source, &self.topic)
    }

    /// Appends one message, arming the await timer on the first entry of a
    /// fresh batch and flushing when the count bound is reached.
    ///
    /// A zero max-await flushes every append immediately.
    async fn offer(self: &Arc<Self>, message: Message) {
        let taken = {
            let mut state = self.state.lock().await;

            if state.messages.is_empty() {
                state.opened_at = Some(Instant::now());
                debug!(
                    event = events::BATCH_OPEN,
                    component = COMPONENT,
                    topic_label = self.topic_label(),
                    generation = state.generation,
                    "opened new batch"
                );
                if !self.bulk.max_await.is_zero() {
                    self.arm_timer(state.generation);
                }
            }

            state.messages.push(message);
            debug!(
                event = events::BATCH_APPEND,
                component = COMPONENT,
                topic_label = self.topic_label(),
                batch_size = state.messages.len(),
                "appended entry to batch"
            );

            if state.messages.len() >= self.bulk.max_count || self.bulk.max_await.is_zero() {
                self.take_batch(&mut state)
            } else {
                None
            }
        };

        if let Some(batch) = taken {
            debug!(
                event = events::BATCH_FLUSH_COUNT,
                component = COMPONENT,
                topic_label = self.topic_label(),
                batch_size = batch.len(),
                "flushing batch on count bound"
            );
            self.send_to_flush_queue(batch).await;
        }
    }

    fn arm_timer(self: &Arc<Self>, armed_generation: u64) {
        let accumulator = self.clone();
        let max_await = self.bulk.max_await;
        tokio::spawn(async move {
            tokio::time::sleep(max_await).await;
            accumulator.flush_on_timer(armed_generation).await;
        });
    }

    async fn flush_on_timer(&self, armed_generation: u64) {
        let taken = {
            let mut state = self.state.lock().await;
            if state.generation != armed_generation {
                debug!(
                    event = events::BATCH_FLUSH_STALE_TIMER,
                    component = COMPONENT,
                    topic_label = self.topic_label(),
                    generation = armed_generation,
                    "timer fired for an already-flushed batch"
                );
                return;
            }
            self.take_batch(&mut state)
        };

        if let Some(batch) = taken {
            debug!(
                event = events::BATCH_FLUSH_TIMER,
                component = COMPONENT,
                topic_label = self.topic_label(),
                batch_size = batch.len(),
                "flushing batch on max-await timer"
            );
            self.send_to_flush_queue(batch).await;
        }
    }

    /// Removes pending entries without queueing them, for explicit flushes.
    async fn take_pending(&self) -> Option<Batch> {
        let mut state = self.state.lock().await;
        self.take_batch(&mut state)
    }

    fn take_batch(&self, state: &mut AccumulatorState) -> Option<Batch> {
        if state.messages.is_empty() {
            return None;
        }
        state.generation += 1;
        let opened_at = state.opened_at.take().unwrap_or_else(Instant::now);
        let messages = std::mem::take(&mut state.messages);
        Some(Batch::opened_at(
            &self.pubsub_source,
            &self.topic,
            messages,
            opened_at,
        ))
    }

    async fn send_to_flush_queue(&self, batch: Batch) {
        if self.flush_queue.send(batch).await.is_err() {
            warn!(
                event = events::BATCH_QUEUE_SEND_FAILED,
                component = COMPONENT,
                topic_label = self.topic_label(),
                reason = fields::REASON_QUEUE_CLOSED,
                "flush queue closed; batch discarded"
            );
        }
    }
}

/// Batcher for bulk subscriptions: accumulates offered messages per topic and
/// hands full or timed-out batches to the flush queue.
///
/// Non-bulk topics bypass accumulation; each offer becomes a singleton batch.
pub struct TopicBatcher {
    registry: Arc<TopicRegistry>,
    flush_queue: Sender<Batch>,
    accumulators: Mutex<HashMap<(String, String), Arc<TopicAccumulator>>>,
}

impl TopicBatcher {
    pub fn new(registry: Arc<TopicRegistry>, flush_queue: Sender<Batch>) -> Self {
        Self {
            registry,
            flush_queue,
            accumulators: Mutex::new(HashMap::new()),
        }
    }

    /// Offers one message for (source, topic) accumulation.
    ///
    /// Offers to different topics never block on each other; contention is
    /// per-accumulator.
    pub async fn offer(&self, pubsub_source: &str, topic: &str, message: Message) {
        match self.registry.bulk_config(pubsub_source, topic) {
            Some(bulk) => {
                let accumulator = self.accumulator_for(pubsub_source, topic, bulk).await;
                accumulator.offer(message).await;
            }
            None => {
                // Non-bulk route: singleton batch, no timer.
                let batch = Batch::new(pubsub_source, topic, vec![message]);
                if self.flush_queue.send(batch).await.is_err() {
                    warn!(
                        event = events::BATCH_QUEUE_SEND_FAILED,
                        component = COMPONENT,
                        topic_label = fields::format_topic_label(pubsub_source, topic),
                        reason = fields::REASON_QUEUE_CLOSED,
                        "flush queue closed; singleton batch discarded"
                    );
                }
            }
        }
    }

    /// Takes the in-progress batch for a topic without waiting for its bounds.
    ///
    /// Returns `None` when nothing was ever offered (or everything already
    /// flushed); callers translate that into an empty response without
    /// invoking the dispatcher.
    pub async fn take_pending(&self, pubsub_source: &str, topic: &str) -> Option<Batch> {
        let accumulator = {
            let accumulators = self.accumulators.lock().await;
            accumulators
                .get(&(pubsub_source.to_string(), topic.to_string()))
                .cloned()
        };
        match accumulator {
            Some(accumulator) => accumulator.take_pending().await,
            None => None,
        }
    }

    async fn accumulator_for(
        &self,
        pubsub_source: &str,
        topic: &str,
        bulk: BulkConfig,
    ) -> Arc<TopicAccumulator> {
        let mut accumulators = self.accumulators.lock().await;
        accumulators
            .entry((pubsub_source.to_string(), topic.to_string()))
            .or_insert_with(|| {
                Arc::new(TopicAccumulator::new(
                    pubsub_source,
                    topic,
                    bulk,
                    self.flush_queue.clone(),
                ))
            })
            .clone()
    }
}
