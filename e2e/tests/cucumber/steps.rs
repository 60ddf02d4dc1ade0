use cucumber::{gherkin::Step, given, then, when};
use e2e::helpers::order_json_matches;
use log::debug;
use nats_tools::ORDER_SUBJECT;
use order_ingest_engine::{db_types::OrderUid, helpers::sample_order};

use crate::cucumber::{
    setup::{publish_raw, publish_sample_order, MALFORMED_ORDER},
    OigWorld,
};

#[given("a running order ingest gateway")]
async fn running_gateway(world: &mut OigWorld) {
    world.connect().await;
    world.start_consumer().await;
}

#[given(expr = "sample order {int} is not known to the gateway")]
async fn forget_sample_order(world: &mut OigWorld, index: u32) {
    let order = sample_order(index);
    world.forget_order(&order.order_uid).await;
}

#[given("I am watching the dead-letter subject")]
async fn watch_dead_letters(world: &mut OigWorld) {
    world.watch_dead_letters().await;
}

#[when(expr = "I publish sample order {int}")]
async fn publish_order(world: &mut OigWorld, index: u32) {
    let order = publish_sample_order(world.nats(), index).await;
    world.last_order = Some(order);
}

#[when("I publish a malformed order")]
async fn publish_malformed(world: &mut OigWorld) {
    publish_raw(world.nats(), MALFORMED_ORDER).await;
}

#[then(expr = "the store holds order {string} with {int} item(s)")]
async fn store_holds_order(world: &mut OigWorld, order_uid: String, items: usize) {
    let order = world.wait_for_stored_order(&OrderUid::new(order_uid)).await;
    assert_eq!(order.items.len(), items);
    if let Some(published) = &world.last_order {
        assert_eq!(&order, published, "The stored order differs from the published one");
    }
}

#[then(expr = "the stored order {string} matches:")]
async fn stored_order_matches(world: &mut OigWorld, order_uid: String, step: &Step) {
    let order = world.wait_for_stored_order(&OrderUid::new(order_uid)).await;
    let actual = serde_json::to_string(&order).expect("Error serializing order");
    let expected = step.docstring().expect("No expected order");
    debug!("Stored order: {actual}");
    assert!(order_json_matches(expected, &actual), "Expected the stored order to match '{expected}', got '{actual}'");
}

#[then(expr = "the cache holds order {string}")]
async fn cache_holds_order(world: &mut OigWorld, order_uid: String) {
    let order_uid = OrderUid::new(order_uid);
    let cached = world.wait_for_cached_order(&order_uid).await;
    let stored = world.wait_for_stored_order(&order_uid).await;
    assert_eq!(cached, stored, "The cached order differs from the stored one");
}

#[then(expr = "the order is dead-lettered after {int} attempts")]
async fn dead_lettered(world: &mut OigWorld, attempts: u64) {
    let letter = world.next_dead_letter().await;
    assert_eq!(letter.attempts, attempts);
    assert_eq!(letter.original_subject, ORDER_SUBJECT);
    assert_eq!(letter.payload.as_ref(), MALFORMED_ORDER.as_bytes());
    assert!(!letter.reason.is_empty(), "The dead letter carries no reason");
}
