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

//! Subscription rule model and the handler capability seam.

use crate::config::SubscriptionSettings;
use crate::envelope::{Message, Outcome};
use crate::registry::match_expression::{ExpressionError, MatchExpression};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// Failure signaled by a handler for one message.
///
/// `Transient` failures are eligible for redelivery; `Permanent` failures are
/// discarded without redelivery.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HandlerError {
    Transient(String),
    Permanent(String),
}

impl HandlerError {
    /// The outcome recorded for the entry that produced this error.
    pub fn outcome(&self) -> Outcome {
        match self {
            HandlerError::Transient(_) => Outcome::Retry,
            HandlerError::Permanent(_) => Outcome::Drop,
        }
    }
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerError::Transient(reason) => write!(f, "transient handler failure: {reason}"),
            HandlerError::Permanent(reason) => write!(f, "permanent handler failure: {reason}"),
        }
    }
}

impl Error for HandlerError {}

/// Application-level processing capability invoked per message.
///
/// Handlers are assumed independent across messages; the dispatcher may invoke
/// them concurrently within one batch.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError>;
}

/// Bulk accumulation bounds for one subscription.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BulkConfig {
    pub max_count: usize,
    pub max_await: Duration,
}

impl BulkConfig {
    /// A batch needs at least one entry; zero counts clamp to one.
    pub fn new(max_count: usize, max_await: Duration) -> Self {
        Self {
            max_count: max_count.max(1),
            max_await,
        }
    }
}

/// One registered subscription: routing identity, match policy, priority,
/// handler capability, and optional bulk bounds.
#[derive(Clone)]
pub struct SubscriptionRule {
    pubsub_source: String,
    topic: String,
    route: String,
    match_expression: Option<MatchExpression>,
    priority: i32,
    handler: Arc<dyn MessageHandler>,
    bulk: Option<BulkConfig>,
}

impl SubscriptionRule {
    /// Creates a default-priority rule without match policy or bulk bounds.
    pub fn new(
        pubsub_source: &str,
        topic: &str,
        route: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            pubsub_source: pubsub_source.to_string(),
            topic: topic.to_string(),
            route: route.to_string(),
            match_expression: None,
            priority: 0,
            handler,
            bulk: None,
        }
    }

    /// Builds a rule from declared per-subscription settings, compiling the
    /// match expression once up front.
    pub fn from_settings(
        pubsub_source: &str,
        topic: &str,
        route: &str,
        settings: &SubscriptionSettings,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Self, ExpressionError> {
        let match_expression = settings
            .match_expression
            .as_deref()
            .map(MatchExpression::compile)
            .transpose()?;

        let mut rule = Self::new(pubsub_source, topic, route, handler)
            .with_priority(settings.priority);
        rule.match_expression = match_expression;
        Ok(rule.with_bulk_option(settings.bulk_config()))
    }

    pub fn with_match_expression(mut self, match_expression: MatchExpression) -> Self {
        self.match_expression = Some(match_expression);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_bulk(mut self, bulk: BulkConfig) -> Self {
        self.bulk = Some(bulk);
        self
    }

    fn with_bulk_option(mut self, bulk: Option<BulkConfig>) -> Self {
        self.bulk = bulk;
        self
    }

    pub fn pubsub_source(&self) -> &str {
        &self.pubsub_source
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn match_expression(&self) -> Option<&MatchExpression> {
        self.match_expression.as_ref()
    }

    pub fn handler(&self) -> Arc<dyn MessageHandler> {
        self.handler.clone()
    }

    pub fn bulk(&self) -> Option<BulkConfig> {
        self.bulk
    }

    /// Whether this rule accepts the message. An absent expression acts as a
    /// default rule and accepts everything.
    pub fn accepts(&self, message: &Message) -> bool {
        self.match_expression
            .as_ref()
            .map_or(true, |expression| expression.matches(message))
    }
}

impl std::fmt::Debug for SubscriptionRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRule")
            .field("pubsub_source", &self.pubsub_source)
            .field("topic", &self.topic)
            .field("route", &self.route)
            .field(
                "match_expression",
                &self.match_expression.as_ref().map(MatchExpression::source),
            )
            .field("priority", &self.priority)
            .field("bulk", &self.bulk)
            .finish()
    }
}
