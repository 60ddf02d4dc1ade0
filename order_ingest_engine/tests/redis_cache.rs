use oig_common::Secret;
use order_ingest_engine::{
    db_types::OrderUid,
    helpers::sample_order,
    test_utils::prepare_env::{test_service_url, TEST_REDIS_ADDR},
    OrderCache,
    RedisConfig,
    RedisOrderCache,
};

async fn connect(addr: String) -> RedisOrderCache {
    let config = RedisConfig { addr, password: Secret::default(), db: 0 };
    RedisOrderCache::connect(&config).await.expect("Error connecting to Redis")
}

#[tokio::test]
async fn store_fetch_remove() {
    let Some(addr) = test_service_url(TEST_REDIS_ADDR) else { return };
    let cache = connect(addr).await;
    let order = sample_order(900);
    let uid = order.order_uid.clone();
    cache.store_order(&uid, &order).await.unwrap();
    assert_eq!(cache.fetch_order(&uid).await.unwrap(), Some(order));

    let ttl = cache.time_to_live(&uid).await.unwrap().expect("entry has a ttl");
    assert!(ttl > 23 * 60 * 60 && ttl <= 24 * 60 * 60, "ttl was {ttl}");

    cache.remove_order(&uid).await.unwrap();
    assert!(cache.fetch_order(&uid).await.unwrap().is_none());
}

#[tokio::test]
async fn miss_is_none() {
    let Some(addr) = test_service_url(TEST_REDIS_ADDR) else { return };
    let cache = connect(addr).await;
    let uid = OrderUid::from("never-cached-order");
    assert!(cache.fetch_order(&uid).await.unwrap().is_none());
}
