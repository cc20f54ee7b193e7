//! Contract test: Create idempotency
//!
//! A re-run after a crash between "remote mutation succeeded" and "result
//! reported to the host engine" must not create duplicate remote state.
//!
//! Constraints verified:
//! - Create called twice yields the same external_id and one remote record
//! - Create never auto-resolves a collision with a divergent record
//! - Malformed desired state is rejected before any network call

mod common;

use common::*;
use std::net::Ipv4Addr;
use unify_dns_core::error::Error;
use unify_dns_core::provider::{CreateOutcome, RecordProvider};
use unify_dns_core::record::{DesiredRecord, RecordTarget};
use unify_dns_core::retry::Cancellation;

fn desired() -> DesiredRecord {
    DesiredRecord::new(
        "nas.example.internal",
        RecordTarget::Ipv4(Ipv4Addr::new(10, 0, 0, 5)),
        300,
    )
}

#[tokio::test]
async fn create_twice_yields_same_id_and_one_record() {
    let api = MockRecordApi::new();
    let provider = RecordProvider::new(Box::new(api.clone())).with_retry_policy(fast_retry());
    let cancel = Cancellation::none();

    let first = provider.create(&desired(), &cancel).await.unwrap();
    let CreateOutcome::Created(first_observed) = &first else {
        panic!("expected Created, got {first:?}");
    };

    // Simulating a retried run after a crash before the result was reported
    let second = provider.create(&desired(), &cancel).await.unwrap();
    let CreateOutcome::AlreadyExists(second_observed) = &second else {
        panic!("expected AlreadyExists, got {second:?}");
    };

    assert_eq!(first_observed.external_id, second_observed.external_id);
    assert_eq!(api.record_count(), 1, "at most one remote record may exist");
    assert_eq!(api.create_calls(), 1, "second run must not re-create");
}

#[tokio::test]
async fn create_returns_observed_state_equal_to_desired() {
    let api = MockRecordApi::new();
    let provider = RecordProvider::new(Box::new(api.clone())).with_retry_policy(fast_retry());

    let outcome = provider.create(&desired(), &Cancellation::none()).await.unwrap();
    let observed = outcome.observed();

    assert!(!observed.external_id.is_empty());
    assert_eq!(observed.domain_name, "nas.example.internal");
    assert_eq!(observed.target, RecordTarget::Ipv4(Ipv4Addr::new(10, 0, 0, 5)));
    assert_eq!(observed.ttl, 300);
}

#[tokio::test]
async fn create_conflicts_on_divergent_existing_record() {
    let api = MockRecordApi::new();

    // Same name, different target: ambiguous state requiring operator resolution
    let mut divergent = desired();
    divergent.target = RecordTarget::Ipv4(Ipv4Addr::new(192, 168, 1, 50));
    api.seed(&divergent);

    let provider = RecordProvider::new(Box::new(api.clone())).with_retry_policy(fast_retry());

    let result = provider.create(&desired(), &Cancellation::none()).await;
    assert!(matches!(result, Err(Error::Conflict(_))));
    assert_eq!(api.create_calls(), 0, "conflict must never be auto-overwritten");
    assert_eq!(api.record_count(), 1);
}

#[tokio::test]
async fn malformed_desired_rejected_before_network() {
    let api = MockRecordApi::new();
    let provider = RecordProvider::new(Box::new(api.clone())).with_retry_policy(fast_retry());

    let mut bad = desired();
    bad.domain_name = "double..dot.example".to_string();

    let result = provider.create(&bad, &Cancellation::none()).await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(api.find_calls(), 0);
    assert_eq!(api.create_calls(), 0);
}
