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

//! Per-subscription configuration consumed at registration time.

use crate::registry::rule::BulkConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_bulk_sub_count() -> usize {
    1
}

/// Declared settings for one subscription.
///
/// `max_bulk_sub_count = 1` (the default) means the subscription is not bulk
/// and every message dispatches as a singleton; `max_bulk_sub_await_duration_ms = 0`
/// flushes a partial batch immediately.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionSettings {
    #[serde(default = "default_max_bulk_sub_count")]
    pub max_bulk_sub_count: usize,
    #[serde(default)]
    pub max_bulk_sub_await_duration_ms: u64,
    #[serde(default)]
    pub match_expression: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            max_bulk_sub_count: default_max_bulk_sub_count(),
            max_bulk_sub_await_duration_ms: 0,
            match_expression: None,
            priority: 0,
        }
    }
}

impl SubscriptionSettings {
    /// Parses settings from a json5 document.
    pub fn from_json5(input: &str) -> Result<Self, json5::Error> {
        json5::from_str(input)
    }

    /// Bulk bounds implied by these settings, `None` for non-bulk routes.
    pub fn bulk_config(&self) -> Option<BulkConfig> {
        if self.max_bulk_sub_count <= 1 {
            return None;
        }
        Some(BulkConfig::new(
            self.max_bulk_sub_count,
            Duration::from_millis(self.max_bulk_sub_await_duration_ms),
        ))
    }
}
