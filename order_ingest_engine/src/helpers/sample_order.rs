use chrono::{DateTime, TimeZone, Utc};

use crate::db_types::{Delivery, Item, Order, OrderUid, Payment};

/// Creation timestamp used by [`sample_order`]. Whole seconds, so that it survives a round trip through the database
/// unchanged.
pub fn sample_order_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).single().unwrap_or_default()
}

/// A deterministic sample order, distinguished by `index`.
pub fn sample_order(index: u32) -> Order {
    sample_order_at(index, sample_order_timestamp())
}

/// Builds sample order number `index`, created at `created_at`.
///
/// The order uid is `b563feb7b2b84b6test<index>` and it carries a single item whose `chrt_id` and `nm_id` are offset
/// by `index`.
pub fn sample_order_at(index: u32, created_at: DateTime<Utc>) -> Order {
    let order_uid = format!("b563feb7b2b84b6test{index}");
    let track_number = format!("WBILMTESTTRACK{index}");
    let index = i64::from(index);
    Order {
        order_uid: OrderUid::new(order_uid.as_str()),
        track_number: track_number.clone(),
        entry: "WBIL".into(),
        delivery: Delivery {
            name: "Test Testov".into(),
            phone: "+9720000000".into(),
            zip: "2639809".into(),
            city: "Kiryat Mozkin".into(),
            address: "Ploshad Mira 15".into(),
            region: "Kraiot".into(),
            email: "test@gmail.com".into(),
        },
        payment: Payment {
            transaction: order_uid,
            request_id: String::new(),
            currency: "USD".into(),
            provider: "wbpay".into(),
            amount: 1817,
            payment_dt: created_at.timestamp(),
            bank: "alpha".into(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items: vec![Item {
            chrt_id: 9934930 + index,
            track_number,
            price: 453,
            rid: format!("ab4219087a764ae0btest{index}"),
            name: "Mascaras".into(),
            sale: 30,
            size: "0".into(),
            total_price: 317,
            nm_id: 2389212 + index,
            brand: "Vivienne Sabo".into(),
            status: 202,
        }],
        locale: "en".into(),
        internal_signature: String::new(),
        customer_id: "test".into(),
        delivery_service: "meest".into(),
        shard_key: "9".into(),
        sm_id: 99,
        date_created: created_at,
        oof_shard: "1".into(),
    }
}
