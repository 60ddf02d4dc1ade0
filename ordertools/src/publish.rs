use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{SubsecRound, Utc};
use log::*;
use nats_tools::{NatsClient, NatsConfig};
use order_ingest_engine::helpers::{sample_order, sample_order_at};

use crate::{PublishParams, SampleParams};

/// Publishes `count` sample orders, one every `interval_ms`. A failed publish is logged and skipped. Ctrl-C stops the
/// run early.
pub async fn publish_orders(params: PublishParams) -> Result<()> {
    let config = NatsConfig::from_env_or_default().with_name("ordertools");
    let client = NatsClient::connect(&config).await.context("Could not connect to NATS")?;
    client.ensure_order_stream().await.context("Could not provision the order stream")?;
    info!("Publishing {} orders to {} every {}ms", params.count, params.subject, params.interval_ms);

    let mut ticker = tokio::time::interval(Duration::from_millis(params.interval_ms.max(1)));
    // the first tick completes immediately; orders go out one interval apart, starting one interval from now
    ticker.tick().await;
    let mut published = 0u32;
    for index in params.start..params.start.saturating_add(params.count) {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            },
            _ = ticker.tick() => {},
        }
        let order = sample_order_at(index, Utc::now().trunc_subsecs(6));
        match client.publish_json(&params.subject, &order).await {
            Ok(()) => {
                published += 1;
                info!("Published order {} ({}), {published} so far", order.order_uid, order.track_number);
            },
            Err(e) => error!("Failed to publish order {}. {e}", order.order_uid),
        }
    }
    client.flush().await.context("Could not flush the NATS connection")?;
    println!("Published {published} of {} orders", params.count);
    Ok(())
}

pub fn print_sample_order(params: SampleParams) -> Result<()> {
    let order = sample_order(params.index);
    let json = serde_json::to_string_pretty(&order)?;
    println!("{json}");
    Ok(())
}
