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

//! Bulk response assembly in input-entry order.

use crate::envelope::{Batch, BulkResponse, BulkResponseEntry, Outcome};
use crate::observability::{events, fields};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tracing::error;

const COMPONENT: &str = "response_aggregator";

/// Invariant violation: a dispatched entry has no recorded outcome.
///
/// The dispatcher contract guarantees full coverage, so this never surfaces in
/// normal operation; it exists as a defensive assertion, not a runtime outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IncompleteOutcomeError {
    pub entry_id: String,
    pub topic: String,
}

impl Display for IncompleteOutcomeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no outcome recorded for entry `{}` of topic `{}`",
            self.entry_id, self.topic
        )
    }
}

impl Error for IncompleteOutcomeError {}

/// Assembles per-entry outcomes into one ordered `BulkResponse`.
///
/// Output order is the batch's input order, one entry per input message.
pub fn aggregate(
    batch: &Batch,
    outcomes: &HashMap<String, Outcome>,
) -> Result<BulkResponse, IncompleteOutcomeError> {
    let mut entries = Vec::with_capacity(batch.len());

    for message in batch.messages() {
        let Some(outcome) = outcomes.get(message.entry_id()) else {
            error!(
                event = events::AGGREGATE_MISSING_OUTCOME,
                component = COMPONENT,
                topic_label = fields::format_batch_label(batch),
                entry_id = message.entry_id(),
                "dispatcher produced no outcome for entry"
            );
            return Err(IncompleteOutcomeError {
                entry_id: message.entry_id().to_string(),
                topic: batch.topic().to_string(),
            });
        };
        entries.push(BulkResponseEntry {
            entry_id: message.entry_id().to_string(),
            outcome: *outcome,
        });
    }

    Ok(BulkResponse::new(entries))
}
