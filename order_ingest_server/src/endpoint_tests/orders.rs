use actix_web::{http::StatusCode, web};
use order_ingest_engine::{
    db_types::Order,
    helpers::sample_order,
    MemoryDatabase,
    MemoryOrderCache,
    OrderFlowApi,
    OrderStore,
};

use super::{
    helpers::get_request,
    mocks::{MockErr, MockOrderCache, MockOrderStore},
};
use crate::routes::configure_routes;

#[actix_web::test]
async fn liveness() {
    let api = OrderFlowApi::new(MemoryDatabase::new(), MemoryOrderCache::new());
    let (status, body) = get_request("/live", |cfg| {
        cfg.app_data(web::Data::new(api));
        configure_routes::<MemoryDatabase, MemoryOrderCache>(cfg);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"ok"}"#);
}

#[actix_web::test]
async fn fetch_stored_order() {
    let db = MemoryDatabase::new();
    let order = sample_order(0);
    db.create_order(&order).await.unwrap();
    let cache = MemoryOrderCache::new();
    let api = OrderFlowApi::new(db, cache.clone());
    let (status, body) = get_request("/orders/b563feb7b2b84b6test0", |cfg| {
        cfg.app_data(web::Data::new(api));
        configure_routes::<MemoryDatabase, MemoryOrderCache>(cfg);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(fetched, order);
    assert!(body.contains(r#""shardkey":"9""#), "body was {body}");
    assert!(cache.contains(&order.order_uid));
}

#[actix_web::test]
async fn fetch_unknown_order() {
    let api = OrderFlowApi::new(MemoryDatabase::new(), MemoryOrderCache::new());
    let (status, body) = get_request("/orders/nope", |cfg| {
        cfg.app_data(web::Data::new(api));
        configure_routes::<MemoryDatabase, MemoryOrderCache>(cfg);
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order nope does not exist"}"#);
}

#[actix_web::test]
async fn fetch_with_failing_store() {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order().returning(|_| Err(MockErr::new("connection reset")));
    let mut cache = MockOrderCache::new();
    cache.expect_fetch_order().returning(|_| Ok(None));
    let api = OrderFlowApi::new(store, cache);
    let (status, body) = get_request("/orders/b563feb7b2b84b6test0", |cfg| {
        cfg.app_data(web::Data::new(api));
        configure_routes::<MockOrderStore, MockOrderCache>(cfg);
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"An error occurred on the backend of the server. connection reset"}"#);
}
