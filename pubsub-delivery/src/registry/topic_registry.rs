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

//! Topic registry: registration-time dedupe and deterministic rule resolution.

use crate::envelope::Message;
use crate::observability::events;
use crate::registry::match_expression::ExpressionError;
use crate::registry::rule::{BulkConfig, SubscriptionRule};
use arc_swap::ArcSwap;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

const COMPONENT: &str = "topic_registry";

/// Stable handle for one accepted registration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Registration-time failures. These are fatal to startup and are the only
/// errors this engine surfaces to the operator.
#[derive(Debug)]
pub enum RegistrationError {
    DuplicateRoute {
        pubsub_source: String,
        topic: String,
        route: String,
    },
    InvalidMatchExpression(ExpressionError),
}

impl Display for RegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationError::DuplicateRoute {
                pubsub_source,
                topic,
                route,
            } => write!(
                f,
                "route already registered for ({pubsub_source}, {topic}, {route})"
            ),
            RegistrationError::InvalidMatchExpression(err) => {
                write!(f, "match expression rejected: {err}")
            }
        }
    }
}

impl Error for RegistrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegistrationError::InvalidMatchExpression(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ExpressionError> for RegistrationError {
    fn from(err: ExpressionError) -> Self {
        RegistrationError::InvalidMatchExpression(err)
    }
}

/// Dedupe identity: the same (source, topic, route) triple registers once.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct RouteKey {
    pubsub_source: String,
    topic: String,
    route: String,
}

impl RouteKey {
    fn from_rule(rule: &SubscriptionRule) -> Self {
        Self {
            pubsub_source: rule.pubsub_source().to_string(),
            topic: rule.topic().to_string(),
            route: rule.route().to_string(),
        }
    }
}

/// Resolution key: rules are grouped per (source, topic) pair.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct TopicKey {
    pubsub_source: String,
    topic: String,
}

impl TopicKey {
    fn new(pubsub_source: &str, topic: &str) -> Self {
        Self {
            pubsub_source: pubsub_source.to_string(),
            topic: topic.to_string(),
        }
    }
}

#[derive(Clone)]
struct RegisteredRule {
    id: RegistrationId,
    rule: SubscriptionRule,
}

#[derive(Default)]
struct RegistrySnapshot {
    version: u64,
    routes: HashSet<RouteKey>,
    // Vec order is registration order; resolution tie-breaks depend on it.
    rules_by_topic: HashMap<TopicKey, Vec<RegisteredRule>>,
}

/// Read-mostly registry mapping (pubsub source, topic) to ordered rules.
///
/// Readers resolve against an atomically swapped snapshot, so a concurrent
/// registration is observed either fully or not at all, never partially.
pub struct TopicRegistry {
    snapshot: ArcSwap<RegistrySnapshot>,
    next_id: AtomicU64,
    write_lock: Mutex<()>,
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
            next_id: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        }
    }

    /// Registers a rule, rejecting duplicate (source, topic, route) triples.
    pub fn register(&self, rule: SubscriptionRule) -> Result<RegistrationId, RegistrationError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let current = self.snapshot.load();
        let route_key = RouteKey::from_rule(&rule);

        if current.routes.contains(&route_key) {
            warn!(
                event = events::REGISTRY_RULE_REJECTED,
                component = COMPONENT,
                pubsub_source = rule.pubsub_source(),
                topic = rule.topic(),
                route = rule.route(),
                "duplicate route registration rejected"
            );
            return Err(RegistrationError::DuplicateRoute {
                pubsub_source: route_key.pubsub_source,
                topic: route_key.topic,
                route: route_key.route,
            });
        }

        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let topic_key = TopicKey::new(rule.pubsub_source(), rule.topic());

        let mut routes = current.routes.clone();
        routes.insert(route_key);
        let mut rules_by_topic = current.rules_by_topic.clone();
        rules_by_topic
            .entry(topic_key)
            .or_default()
            .push(RegisteredRule {
                id,
                rule: rule.clone(),
            });

        self.snapshot.store(std::sync::Arc::new(RegistrySnapshot {
            version: current.version + 1,
            routes,
            rules_by_topic,
        }));

        debug!(
            event = events::REGISTRY_RULE_REGISTERED,
            component = COMPONENT,
            pubsub_source = rule.pubsub_source(),
            topic = rule.topic(),
            route = rule.route(),
            priority = rule.priority(),
            registration_id = id.value(),
            "rule registered"
        );

        Ok(id)
    }

    /// Resolves the rule that handles one message under (source, topic).
    ///
    /// Highest priority among accepting rules wins; equal priorities favor the
    /// earliest registration. `None` means the caller records `Drop`.
    pub fn resolve(
        &self,
        pubsub_source: &str,
        topic: &str,
        message: &Message,
    ) -> Option<SubscriptionRule> {
        let snapshot = self.snapshot.load();
        let rules = snapshot
            .rules_by_topic
            .get(&TopicKey::new(pubsub_source, topic));

        let resolved = rules.and_then(|rules| {
            let mut best: Option<&RegisteredRule> = None;
            for candidate in rules {
                if !candidate.rule.accepts(message) {
                    continue;
                }
                // Strict comparison keeps the first-registered rule on ties;
                // the Vec is in registration order.
                let better = match best {
                    Some(current) => candidate.rule.priority() > current.rule.priority(),
                    None => true,
                };
                if better {
                    best = Some(candidate);
                }
            }
            best
        });

        match resolved {
            Some(registered) => Some(registered.rule.clone()),
            None => {
                debug!(
                    event = events::REGISTRY_RESOLVE_MISS,
                    component = COMPONENT,
                    pubsub_source,
                    topic,
                    entry_id = message.entry_id(),
                    "no rule matched; entry will be dropped"
                );
                None
            }
        }
    }

    /// Bulk bounds governing accumulation for one (source, topic) pair.
    ///
    /// When several rules declare bulk bounds for the same topic, the earliest
    /// registration wins; accumulation is a per-topic concern.
    pub fn bulk_config(&self, pubsub_source: &str, topic: &str) -> Option<BulkConfig> {
        let snapshot = self.snapshot.load();
        snapshot
            .rules_by_topic
            .get(&TopicKey::new(pubsub_source, topic))?
            .iter()
            .find_map(|registered| registered.rule.bulk())
    }

    /// Whether any rule exists for the (source, topic) pair.
    pub fn has_topic(&self, pubsub_source: &str, topic: &str) -> bool {
        self.snapshot
            .load()
            .rules_by_topic
            .contains_key(&TopicKey::new(pubsub_source, topic))
    }

    #[cfg(test)]
    pub(crate) fn current_version(&self) -> u64 {
        self.snapshot.load().version
    }
}
