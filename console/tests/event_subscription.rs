//! Deploy event subscription tests over an injected stream

mod common;

use tokio::sync::mpsc;

use common::{call_log, harness, MockCluster, MockSalt};
use quarry_console::events::stream::{EventStream, StreamItem};
use quarry_console::models::event::SaltEvent;

fn event(tag: &str) -> SaltEvent {
    SaltEvent {
        tag: tag.to_string(),
        data: serde_json::json!({"fun": "state.orchestrate"}),
    }
}

#[tokio::test]
async fn test_subscription_filters_by_tag_substring() {
    let calls = call_log();
    let h = harness(MockCluster::new(calls.clone()), MockSalt::new(calls));

    let (tx, rx) = mpsc::channel(8);
    tx.send(StreamItem::Event(event("salt/job/1234/ret"))).await.unwrap();
    tx.send(StreamItem::Event(event("salt/run/20230101/new"))).await.unwrap();
    // Tag containment, not equality: a jid that prefixes another matches both
    tx.send(StreamItem::Event(event("salt/job/12345/ret"))).await.unwrap();
    tx.send(StreamItem::End).await.unwrap();

    h.flows
        .subscribe_deploy_events(EventStream::from_channel(rx), "1234")
        .await;

    let log = h.state.events_for("1234").await;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].tag, "salt/job/1234/ret");
    assert_eq!(log[1].tag, "salt/job/12345/ret");
}

#[tokio::test]
async fn test_subscription_ends_when_sender_drops() {
    let calls = call_log();
    let h = harness(MockCluster::new(calls.clone()), MockSalt::new(calls));

    let (tx, rx) = mpsc::channel(8);
    tx.send(StreamItem::Event(event("salt/job/77/new"))).await.unwrap();
    drop(tx);

    // A closed channel reads as end of stream, the loop must return
    h.flows
        .subscribe_deploy_events(EventStream::from_channel(rx), "77")
        .await;

    assert_eq!(h.state.events_for("77").await.len(), 1);
}

#[tokio::test]
async fn test_route_event_fans_out_to_all_matching_jobs() {
    let calls = call_log();
    let h = harness(MockCluster::new(calls.clone()), MockSalt::new(calls));

    h.ledger.record_job("1234", "node-1").await.unwrap();
    h.ledger.record_job("12345", "node-2").await.unwrap();
    h.ledger.record_job("999", "node-3").await.unwrap();

    // The tag contains both "1234" and "12345"
    let incoming = event("salt/job/12345/ret");
    h.flows.route_event(&incoming).await.unwrap();

    assert_eq!(h.state.events_for("1234").await.len(), 1);
    assert_eq!(h.state.events_for("12345").await.len(), 1);
    assert!(h.state.events_for("999").await.is_empty());
}

#[tokio::test]
async fn test_route_event_appends_once_per_duplicate_record() {
    let calls = call_log();
    let h = harness(MockCluster::new(calls.clone()), MockSalt::new(calls));

    // Redeploying before the previous job is reaped duplicates the record
    h.ledger.record_job("1234", "node-1").await.unwrap();
    h.ledger.record_job("1234", "node-1").await.unwrap();

    h.flows.route_event(&event("salt/job/1234/new")).await.unwrap();

    assert_eq!(h.state.events_for("1234").await.len(), 1);
}
