mod sample_order;

pub use sample_order::{sample_order, sample_order_at, sample_order_timestamp};
