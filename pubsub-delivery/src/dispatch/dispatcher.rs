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

//! Batch dispatch: rule resolution, bounded-concurrency handler invocation,
//! and per-entry outcome collection.

use crate::dispatch::aggregator;
use crate::envelope::{Batch, BulkResponse, BulkResponseEntry, Outcome};
use crate::observability::{events, fields};
use crate::registry::topic_registry::TopicRegistry;
use futures::future;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

const COMPONENT: &str = "dispatcher";

type OutcomeMap = Arc<Mutex<HashMap<String, Outcome>>>;

/// Dispatches flushed batches against the topic registry.
///
/// Handler invocations for distinct entries in one batch run concurrently
/// under a bounded permit pool; outcomes are always emitted in the batch's
/// input order, and one entry's failure never affects another's outcome.
pub struct Dispatcher {
    registry: Arc<TopicRegistry>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    /// Creates a dispatcher with a bounded handler-invocation pool.
    pub fn new(registry: Arc<TopicRegistry>, max_concurrency: usize) -> Self {
        Self {
            registry,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Dispatches one batch to completion and returns per-entry outcomes.
    pub async fn dispatch(&self, batch: Batch) -> BulkResponse {
        self.dispatch_with_deadline(batch, None).await
    }

    /// Dispatches one batch, bounding total handler time by `deadline`.
    ///
    /// When the deadline elapses first, in-flight results are discarded and
    /// every still-unresolved entry is recorded as `Retry`, which is safe for
    /// redelivery.
    pub async fn dispatch_with_deadline(
        &self,
        batch: Batch,
        deadline: Option<Duration>,
    ) -> BulkResponse {
        if batch.is_empty() {
            return BulkResponse::empty();
        }

        debug!(
            event = events::DISPATCH_START,
            component = COMPONENT,
            topic_label = fields::format_batch_label(&batch),
            batch_size = batch.len(),
            "dispatching batch"
        );

        let outcomes: OutcomeMap = Arc::new(Mutex::new(HashMap::with_capacity(batch.len())));
        let mut handles = Vec::new();

        for message in batch.messages() {
            let Some(rule) = self
                .registry
                .resolve(batch.pubsub_source(), batch.topic(), message)
            else {
                // No matching rule: terminal drop, handler never runs.
                debug!(
                    event = events::DISPATCH_ENTRY_DROP_UNROUTED,
                    component = COMPONENT,
                    topic_label = fields::format_batch_label(&batch),
                    entry_id = message.entry_id(),
                    "no rule accepted entry; dropping"
                );
                record(&outcomes, message.entry_id(), Outcome::Drop);
                continue;
            };

            let handler = rule.handler();
            let message = message.clone();
            let permits = self.permits.clone();
            let outcomes_for_task = outcomes.clone();
            let topic_label = fields::format_batch_label(&batch);

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    // The pool is never closed while dispatches are running;
                    // treat a closed pool as a transient condition.
                    record(&outcomes_for_task, message.entry_id(), Outcome::Retry);
                    return;
                };

                let outcome = match handler.handle(&message).await {
                    Ok(()) => Outcome::Success,
                    Err(err) => {
                        warn!(
                            event = events::DISPATCH_ENTRY_HANDLER_FAILED,
                            component = COMPONENT,
                            topic_label = topic_label.as_str(),
                            entry_id = message.entry_id(),
                            outcome = err.outcome().as_str(),
                            err = %err,
                            "handler failed for entry"
                        );
                        err.outcome()
                    }
                };
                record(&outcomes_for_task, message.entry_id(), outcome);
            }));
        }

        self.await_handlers(&batch, handles, deadline).await;

        // Entries left unresolved by a deadline expiry or a panicked handler
        // are recorded as Retry before assembly, keeping coverage total.
        {
            let mut resolved = outcomes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for message in batch.messages() {
                resolved
                    .entry(message.entry_id().to_string())
                    .or_insert(Outcome::Retry);
            }
        }

        let resolved = outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        let response = match aggregator::aggregate(&batch, &resolved) {
            Ok(response) => response,
            Err(err) => {
                // Unreachable after the fill pass above; keep a total response
                // rather than aborting the batch.
                error!(
                    event = events::AGGREGATE_MISSING_OUTCOME,
                    component = COMPONENT,
                    topic_label = fields::format_batch_label(&batch),
                    err = %err,
                    "rebuilding response with retry for uncovered entries"
                );
                BulkResponse::new(
                    batch
                        .messages()
                        .iter()
                        .map(|message| BulkResponseEntry {
                            entry_id: message.entry_id().to_string(),
                            outcome: resolved
                                .get(message.entry_id())
                                .copied()
                                .unwrap_or(Outcome::Retry),
                        })
                        .collect(),
                )
            }
        };

        debug!(
            event = events::DISPATCH_COMPLETE,
            component = COMPONENT,
            topic_label = fields::format_batch_label(&batch),
            batch_size = batch.len(),
            "batch dispatch complete"
        );

        response
    }

    async fn await_handlers(
        &self,
        batch: &Batch,
        handles: Vec<tokio::task::JoinHandle<()>>,
        deadline: Option<Duration>,
    ) {
        let join_all = async {
            for result in future::join_all(handles).await {
                if let Err(err) = result {
                    // A panicking handler only loses its own outcome; the
                    // fill pass maps the entry to Retry.
                    warn!(
                        event = events::DISPATCH_ENTRY_HANDLER_PANICKED,
                        component = COMPONENT,
                        topic_label = fields::format_batch_label(batch),
                        err = %err,
                        "handler task did not complete"
                    );
                }
            }
        };

        match deadline {
            Some(deadline) => {
                if tokio::time::timeout(deadline, join_all).await.is_err() {
                    warn!(
                        event = events::DISPATCH_DEADLINE_EXPIRED,
                        component = COMPONENT,
                        topic_label = fields::format_batch_label(batch),
                        deadline_ms = deadline.as_millis() as u64,
                        "deadline expired; unresolved entries map to retry"
                    );
                }
            }
            None => join_all.await,
        }
    }
}

fn record(outcomes: &OutcomeMap, entry_id: &str, outcome: Outcome) {
    outcomes
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(entry_id.to_string(), outcome);
}
