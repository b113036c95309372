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

mod support;

use pubsub_delivery::{
    BulkConfig, DeliveryEngine, HandlerError, MatchExpression, Outcome, RegistrationError,
    SubscriptionRule, SubscriptionSettings,
};
use std::sync::Arc;
use std::time::Duration;
use support::{message, message_with_type, ChannelSink, CountingHandler, FailingHandler, NullSink};

#[tokio::test(flavor = "multi_thread")]
async fn versioned_rules_route_by_match_expression_and_priority() {
    support::init_logging();

    let engine = DeliveryEngine::new("routing-contract", 16, 4, Arc::new(NullSink));
    let default_handler = Arc::new(CountingHandler::default());
    let v2_handler = Arc::new(CountingHandler::default());

    engine
        .register(SubscriptionRule::new(
            "messagebus",
            "testingtopic",
            "/testingtopic",
            default_handler.clone(),
        ))
        .expect("default rule should register");
    engine
        .register(
            SubscriptionRule::new(
                "messagebus",
                "testingtopic",
                "/testingtopicV2",
                v2_handler.clone(),
            )
            .with_priority(1)
            .with_match_expression(
                MatchExpression::compile(r#"event.type == "v2""#).expect("expression compiles"),
            ),
        )
        .expect("v2 rule should register");

    let v2_outcome = engine
        .submit_single("messagebus", "testingtopic", message_with_type("a", "v2"))
        .await;
    let v1_outcome = engine
        .submit_single("messagebus", "testingtopic", message_with_type("b", "v1"))
        .await;

    assert_eq!(v2_outcome, Outcome::Success);
    assert_eq!(v1_outcome, Outcome::Success);
    assert_eq!(v2_handler.invocation_count(), 1);
    assert_eq!(default_handler.invocation_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn equal_priority_rules_favor_first_registration() {
    support::init_logging();

    let engine = DeliveryEngine::new("tie-break-contract", 16, 4, Arc::new(NullSink));
    let first = Arc::new(CountingHandler::default());
    let second = Arc::new(CountingHandler::default());

    engine
        .register(SubscriptionRule::new(
            "messagebus",
            "testingtopic",
            "/first",
            first.clone(),
        ))
        .expect("first rule should register");
    engine
        .register(SubscriptionRule::new(
            "messagebus",
            "testingtopic",
            "/second",
            second.clone(),
        ))
        .expect("second rule should register");

    engine
        .submit_single("messagebus", "testingtopic", message("a"))
        .await;

    assert_eq!(first.invocation_count(), 1);
    assert_eq!(second.invocation_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn three_offers_produce_one_ordered_batch_of_three() {
    support::init_logging();

    let (sink, mut rx) = ChannelSink::pair();
    let engine = DeliveryEngine::new("bulk-contract", 16, 4, Arc::new(sink));
    engine
        .register(
            SubscriptionRule::new(
                "messagebus",
                "testingtopicbulk",
                "/testingtopicbulk",
                Arc::new(CountingHandler::default()),
            )
            .with_bulk(BulkConfig::new(3, Duration::from_secs(10))),
        )
        .expect("bulk rule should register");

    for id in ["1", "2", "3"] {
        engine
            .offer("messagebus", "testingtopicbulk", message(id))
            .await;
    }

    let (_, topic, response) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("flush response should arrive")
        .expect("sink channel should stay open");

    assert_eq!(topic, "testingtopicbulk");
    let ids: Vec<&str> = response
        .entries()
        .iter()
        .map(|entry| entry.entry_id.as_str())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert!(response
        .entries()
        .iter()
        .all(|entry| entry.outcome == Outcome::Success));

    // Exactly one batch: nothing else is queued behind it.
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_failure_only_affects_its_own_entry() {
    support::init_logging();

    let engine = DeliveryEngine::new("isolation-contract", 16, 4, Arc::new(NullSink));
    engine
        .register(SubscriptionRule::new(
            "messagebus",
            "testingtopicbulk",
            "/testingtopicbulk",
            Arc::new(FailingHandler {
                failing_entry: "x".to_string(),
                error: HandlerError::Transient("downstream unavailable".to_string()),
            }),
        ))
        .expect("rule should register");

    let response = engine
        .submit_bulk(
            "messagebus",
            "testingtopicbulk",
            vec![message("1"), message("x"), message("3")],
        )
        .await;

    assert_eq!(response.outcome_of("x"), Some(Outcome::Retry));
    assert_eq!(response.outcome_of("1"), Some(Outcome::Success));
    assert_eq!(response.outcome_of("3"), Some(Outcome::Success));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_bulk_submission_returns_empty_response() {
    support::init_logging();

    let handler = Arc::new(CountingHandler::default());
    let engine = DeliveryEngine::new("empty-contract", 16, 4, Arc::new(NullSink));
    engine
        .register(SubscriptionRule::new(
            "messagebus",
            "testingtopicbulk",
            "/testingtopicbulk",
            handler.clone(),
        ))
        .expect("rule should register");

    let response = engine
        .submit_bulk("messagebus", "testingtopicbulk", vec![])
        .await;

    assert!(response.is_empty());
    assert_eq!(handler.invocation_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_route_registration_fails_startup() {
    support::init_logging();

    let engine = DeliveryEngine::new("dup-contract", 16, 4, Arc::new(NullSink));
    let settings = SubscriptionSettings::default();

    engine
        .register_with_settings(
            "mockPubSub",
            "mockTopic",
            "/mockRoute",
            &settings,
            Arc::new(CountingHandler::default()),
        )
        .expect("first registration should pass");

    let duplicate = engine.register_with_settings(
        "mockPubSub",
        "mockTopic",
        "/mockRoute",
        &settings,
        Arc::new(CountingHandler::default()),
    );

    assert!(matches!(
        duplicate,
        Err(RegistrationError::DuplicateRoute { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_match_expression_fails_registration() {
    support::init_logging();

    let engine = DeliveryEngine::new("expr-contract", 16, 4, Arc::new(NullSink));
    let settings = SubscriptionSettings {
        match_expression: Some("event.type is v2".to_string()),
        ..SubscriptionSettings::default()
    };

    let rejected = engine.register_with_settings(
        "mockPubSub",
        "mockTopic",
        "/mockRoute",
        &settings,
        Arc::new(CountingHandler::default()),
    );

    assert!(matches!(
        rejected,
        Err(RegistrationError::InvalidMatchExpression(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn unrouted_messages_drop_without_handler_invocation() {
    support::init_logging();

    let handler = Arc::new(CountingHandler::default());
    let engine = DeliveryEngine::new("drop-contract", 16, 4, Arc::new(NullSink));
    engine
        .register(SubscriptionRule::new(
            "messagebus",
            "testingtopic",
            "/testingtopic",
            handler.clone(),
        ))
        .expect("rule should register");

    let outcome = engine
        .submit_single("other-bus", "testingtopic", message("1"))
        .await;

    assert_eq!(outcome, Outcome::Drop);
    assert_eq!(handler.invocation_count(), 0);
}
