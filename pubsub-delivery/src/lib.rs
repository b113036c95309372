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

//! # pubsub-delivery
//!
//! `pubsub-delivery` implements a bulk-aware pub/sub delivery engine: topic
//! routing of messages to registered subscription rules, per-entry
//! success/retry/drop outcomes, and batch accumulation bounded by count and by
//! a maximum await duration.
//!
//! The engine is transport-agnostic. Decoding wire envelopes into [`Message`]
//! values and re-encoding [`BulkResponse`] outcomes belongs to the transport
//! collaborator; application logic plugs in through the [`MessageHandler`]
//! capability trait.
//!
//! Typical usage is API-first and centered on [`DeliveryEngine`].
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use pubsub_delivery::{
//!     BulkResponse, BulkResponseSink, DeliveryEngine, HandlerError, Message, MessageHandler,
//!     Outcome, SubscriptionRule,
//! };
//!
//! struct PrintHandler;
//!
//! #[async_trait]
//! impl MessageHandler for PrintHandler {
//!     async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
//!         println!("subscriber got entry {}", message.entry_id());
//!         Ok(())
//!     }
//! }
//!
//! struct NullSink;
//!
//! #[async_trait]
//! impl BulkResponseSink for NullSink {
//!     async fn on_response(&self, _source: &str, _topic: &str, _response: BulkResponse) {}
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = DeliveryEngine::new("quick-start", 16, 4, Arc::new(NullSink));
//! engine
//!     .register(SubscriptionRule::new(
//!         "messagebus",
//!         "orders",
//!         "/orders",
//!         Arc::new(PrintHandler),
//!     ))
//!     .unwrap();
//!
//! let outcome = engine
//!     .submit_single(
//!         "messagebus",
//!         "orders",
//!         Message::new("1", b"{}".to_vec(), "application/json"),
//!     )
//!     .await;
//! assert_eq!(outcome, Outcome::Success);
//! # });
//! ```
//!
//! ## Match expressions and priority
//!
//! A rule may carry a compile-once match expression; among accepting rules the
//! highest priority wins and equal priorities favor the earliest registration.
//! A rule without an expression acts as the default route.
//!
//! ```
//! use pubsub_delivery::{MatchExpression, Message};
//! use std::collections::HashMap;
//!
//! let expression = MatchExpression::compile(r#"event.type == "v2""#).unwrap();
//!
//! let mut metadata = HashMap::new();
//! metadata.insert("type".to_string(), "v2".to_string());
//! let v2 = Message::with_metadata("1", vec![], "application/json", metadata);
//!
//! assert!(expression.matches(&v2));
//! assert!(!expression.matches(&Message::new("2", vec![], "application/json")));
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: outward [`DeliveryEngine`]/[`BulkResponseSink`] surface
//! - Registry: rule model, match expressions, dedupe, deterministic resolution
//! - Batching: per-topic accumulation under count and max-await bounds
//! - Dispatch: bounded-concurrency handler invocation and ordered response
//!   assembly
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events. Library code emits
//! events/spans and does not unconditionally initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod envelope;
pub use envelope::{Batch, BulkResponse, BulkResponseEntry, Message, Outcome};

mod config;
pub use config::SubscriptionSettings;

mod registry;
pub use registry::match_expression::{ExpressionError, MatchExpression};
pub use registry::rule::{BulkConfig, HandlerError, MessageHandler, SubscriptionRule};
pub use registry::topic_registry::{RegistrationError, RegistrationId, TopicRegistry};

mod batching;
pub use batching::batcher::TopicBatcher;

mod dispatch;
pub use dispatch::aggregator::{aggregate, IncompleteOutcomeError};
pub use dispatch::dispatcher::Dispatcher;

#[doc(hidden)]
pub mod observability;

mod engine;
pub use engine::{BulkResponseSink, DeliveryEngine};
