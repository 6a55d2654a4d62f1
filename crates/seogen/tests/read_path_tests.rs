//! Listing, aggregation and publishing over a generated SQLite store.

mod common;

use chrono::Duration;

use common::{ConfigBuilder, TestHarness};

use seogen::db::{DatabaseError, RecordFilter};
use seogen::synth::ContentStatus;
use seogen::RunLease;

fn generated_harness() -> TestHarness {
    let harness = TestHarness::new();
    harness
        .run_sqlite(&ConfigBuilder::new().target(240).batch_size(100).build())
        .unwrap();
    harness
}

#[test]
fn filter_by_dimensions() {
    let harness = generated_harness();
    let store = harness.open_store();

    let (rows, total) = store
        .query(&RecordFilter {
            dimensions: vec![
                ("theme".to_string(), "AI Chatbot".to_string()),
                ("language".to_string(), "English".to_string()),
            ],
            limit: Some(5),
            ..RecordFilter::default()
        })
        .unwrap();

    assert_eq!(total, 12);
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| {
        r.record.dimensions.get("theme") == Some("AI Chatbot")
            && r.record.dimensions.get("language") == Some("English")
    }));
    // Index order.
    assert!(rows.windows(2).all(|w| w[0].record.index < w[1].record.index));
}

#[test]
fn count_by_value_covers_space_evenly() {
    let harness = generated_harness();
    let counts = harness.open_store().count_by_value("theme").unwrap();

    assert_eq!(counts.len(), 5);
    assert!(counts.iter().all(|(_, n)| *n == 48));
}

#[test]
fn publish_then_filter_by_status() {
    let harness = generated_harness();
    let store = harness.open_store();
    let slug = "code-assistant-english-web-developers-1";

    assert!(store.publish(slug).unwrap());
    assert!(!store.publish(slug).unwrap());
    assert!(!store.publish("no-such-slug-0").unwrap());

    let (rows, total) = store
        .query(&RecordFilter {
            status: Some(ContentStatus::Published),
            ..RecordFilter::default()
        })
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].record.slug, slug);

    // Publishing survives a reopen, and does not change the record count.
    let reopened = harness.open_store();
    let stored = reopened.find_by_slug(slug).unwrap().unwrap();
    assert_eq!(stored.record.status, ContentStatus::Published);
    assert_eq!(harness.all_records().len(), 240);
}

#[test]
fn second_process_cannot_take_generation_lease() {
    let harness = TestHarness::new();
    let first = harness.open_database();
    let second = harness.open_database();

    let lease = RunLease::acquire(&first, "generation", Duration::minutes(5)).unwrap();
    match RunLease::acquire(&second, "generation", Duration::minutes(5)) {
        Err(DatabaseError::LeaseHeld { holder, .. }) => assert_eq!(holder, lease.holder()),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("lease acquired twice"),
    }

    lease.release().unwrap();
    assert!(RunLease::acquire(&second, "generation", Duration::minutes(5)).is_ok());
}
