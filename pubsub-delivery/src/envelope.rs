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

//! Wire-format-independent envelope model: single messages, bulk batches,
//! per-entry outcomes, and the ordered bulk response.

use std::collections::HashMap;
use std::time::Instant;

/// A single message as seen by the delivery engine.
///
/// Immutable once constructed. `entry_id` is unique within a batch and is the
/// identity the upstream broker uses to acknowledge or redeliver the entry.
#[derive(Clone, Debug)]
pub struct Message {
    entry_id: String,
    payload: Vec<u8>,
    content_type: String,
    metadata: HashMap<String, String>,
}

impl Message {
    /// Creates a message without metadata.
    pub fn new(entry_id: &str, payload: Vec<u8>, content_type: &str) -> Self {
        Self::with_metadata(entry_id, payload, content_type, HashMap::new())
    }

    /// Creates a message carrying metadata attributes.
    pub fn with_metadata(
        entry_id: &str,
        payload: Vec<u8>,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            entry_id: entry_id.to_string(),
            payload,
            content_type: content_type.to_string(),
            metadata,
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Looks up a typed attribute by name for match-expression evaluation.
    ///
    /// Built-in attributes (`entry_id`, `content_type`) shadow metadata keys;
    /// everything else resolves against metadata. Returns `None` when absent.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "entry_id" => Some(&self.entry_id),
            "content_type" => Some(&self.content_type),
            _ => self.metadata.get(name).map(String::as_str),
        }
    }
}

/// An ordered batch of messages bound for one (pubsub source, topic) pair.
///
/// Owned exclusively by the batcher until flushed; ownership moves to the
/// dispatcher on flush.
#[derive(Clone, Debug)]
pub struct Batch {
    pubsub_source: String,
    topic: String,
    messages: Vec<Message>,
    created_at: Instant,
}

impl Batch {
    pub fn new(pubsub_source: &str, topic: &str, messages: Vec<Message>) -> Self {
        Self::opened_at(pubsub_source, topic, messages, Instant::now())
    }

    /// Builds a batch whose creation instant is the moment its first message
    /// was accepted, as the batcher tracks it.
    pub fn opened_at(
        pubsub_source: &str,
        topic: &str,
        messages: Vec<Message>,
        created_at: Instant,
    ) -> Self {
        Self {
            pubsub_source: pubsub_source.to_string(),
            topic: topic.to_string(),
            messages,
            created_at,
        }
    }

    pub fn pubsub_source(&self) -> &str {
        &self.pubsub_source
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Per-message processing result controlling acknowledgment and redelivery.
///
/// `Retry` is the only redeliverable outcome; `Drop` is a terminal discard.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Success,
    Retry,
    Drop,
}

impl Outcome {
    /// Stable lowercase label used in structured log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Retry => "retry",
            Outcome::Drop => "drop",
        }
    }
}

/// One (entry id, outcome) pair in a bulk response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BulkResponseEntry {
    pub entry_id: String,
    pub outcome: Outcome,
}

/// Ordered per-entry outcomes for one dispatched batch.
///
/// Preserves the input batch's entry order and is never shorter than the
/// input batch unless the batch was empty.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BulkResponse {
    entries: Vec<BulkResponseEntry>,
}

impl BulkResponse {
    pub fn new(entries: Vec<BulkResponseEntry>) -> Self {
        Self { entries }
    }

    /// The empty response returned for empty bulk submissions.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[BulkResponseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the outcome recorded for one entry id.
    pub fn outcome_of(&self, entry_id: &str) -> Option<Outcome> {
        self.entries
            .iter()
            .find(|entry| entry.entry_id == entry_id)
            .map(|entry| entry.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::{BulkResponse, BulkResponseEntry, Message, Outcome};
    use std::collections::HashMap;

    #[test]
    fn attribute_prefers_builtins_over_metadata() {
        let mut metadata = HashMap::new();
        metadata.insert("entry_id".to_string(), "shadowed".to_string());
        metadata.insert("type".to_string(), "v2".to_string());
        let message = Message::with_metadata("entry-1", vec![], "application/json", metadata);

        assert_eq!(message.attribute("entry_id"), Some("entry-1"));
        assert_eq!(message.attribute("content_type"), Some("application/json"));
        assert_eq!(message.attribute("type"), Some("v2"));
        assert_eq!(message.attribute("missing"), None);
    }

    #[test]
    fn bulk_response_preserves_entry_order() {
        let response = BulkResponse::new(vec![
            BulkResponseEntry {
                entry_id: "b".to_string(),
                outcome: Outcome::Retry,
            },
            BulkResponseEntry {
                entry_id: "a".to_string(),
                outcome: Outcome::Success,
            },
        ]);

        assert_eq!(response.len(), 2);
        assert_eq!(response.entries()[0].entry_id, "b");
        assert_eq!(response.outcome_of("a"), Some(Outcome::Success));
        assert_eq!(response.outcome_of("missing"), None);
    }

    #[test]
    fn empty_response_is_empty() {
        assert!(BulkResponse::empty().is_empty());
        assert_eq!(BulkResponse::empty().len(), 0);
    }
}
