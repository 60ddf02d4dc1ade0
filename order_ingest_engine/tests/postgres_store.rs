use log::*;
use order_ingest_engine::{
    db::postgres::orders::count_sub_rows,
    db_types::OrderUid,
    helpers::sample_order,
    test_utils::prepare_env::{delete_order, prepare_test_db, test_service_url, TEST_DATABASE_URL},
    InsertOrderResult,
    OrderStore,
};

#[tokio::test]
async fn create_then_fetch_round_trip() {
    let Some(url) = test_service_url(TEST_DATABASE_URL) else { return };
    let db = prepare_test_db(&url).await;
    let mut order = sample_order(0);
    delete_order(&db, &order.order_uid).await;
    let mut second = order.items[0].clone();
    second.chrt_id = 1;
    second.rid = "second-item".into();
    order.items.push(second);

    let result = db.create_order(&order).await.expect("Error creating order");
    assert_eq!(result, InsertOrderResult::Inserted(order.order_uid.clone()));

    let fetched = db.fetch_order(&order.order_uid).await.expect("Error fetching order").expect("order exists");
    assert_eq!(fetched, order);
    assert_eq!(fetched.items[1].rid, "second-item");
    info!("🚀️ round trip complete");
}

#[tokio::test]
async fn resubmitting_an_order_does_not_duplicate_rows() {
    let Some(url) = test_service_url(TEST_DATABASE_URL) else { return };
    let db = prepare_test_db(&url).await;
    let order = sample_order(1);
    delete_order(&db, &order.order_uid).await;
    db.create_order(&order).await.expect("Error creating order");

    let mut resubmitted = order.clone();
    resubmitted.track_number = "SHOULD-NOT-CHANGE".into();
    resubmitted.payment.amount = 2000;
    let result = db.create_order(&resubmitted).await.expect("Error re-submitting order");
    assert_eq!(result, InsertOrderResult::AlreadyExists(order.order_uid.clone()));

    let mut conn = db.pool().acquire().await.unwrap();
    let counts = count_sub_rows(&order.order_uid, &mut conn).await.unwrap();
    assert_eq!(counts, (1, 1, 1));

    let fetched = db.fetch_order(&order.order_uid).await.unwrap().unwrap();
    assert_eq!(fetched.track_number, order.track_number);
    assert_eq!(fetched.payment.amount, 2000);
}

#[tokio::test]
async fn unknown_order_is_none() {
    let Some(url) = test_service_url(TEST_DATABASE_URL) else { return };
    let db = prepare_test_db(&url).await;
    let fetched = db.fetch_order(&OrderUid::from("does-not-exist")).await.expect("lookup is not an error");
    assert!(fetched.is_none());
}

#[tokio::test]
async fn failed_item_insert_rolls_back_the_order() {
    let Some(url) = test_service_url(TEST_DATABASE_URL) else { return };
    let db = prepare_test_db(&url).await;
    let mut order = sample_order(2);
    delete_order(&db, &order.order_uid).await;
    // Postgres refuses NUL bytes in text columns, so only the item insert can fail
    order.items[0].name = "Mascaras\0".into();
    let err = db.create_order(&order).await.expect_err("item insert must fail");
    assert_eq!(err.write_stage(), Some(order_ingest_engine::db::postgres::WriteStage::Item));
    assert!(db.fetch_order(&order.order_uid).await.unwrap().is_none());
    let mut conn = db.pool().acquire().await.unwrap();
    assert_eq!(count_sub_rows(&order.order_uid, &mut conn).await.unwrap(), (0, 0, 0));
}
