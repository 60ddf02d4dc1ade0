use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::*;
use nats_tools::ORDER_SUBJECT;

mod publish;

use crate::publish::{print_sample_order, publish_orders};

#[derive(Parser, Debug)]
#[command(version, about = "Utilities for the order ingest gateway")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "publish", about = "Publish generated sample orders to the broker")]
    Publish(PublishParams),
    #[clap(name = "sample", about = "Print a generated sample order as JSON")]
    Sample(SampleParams),
}

#[derive(Debug, Args)]
pub struct PublishParams {
    /// Number of orders to publish
    #[arg(short = 'c', long = "count", default_value = "1")]
    count: u32,
    /// Delay between two orders, in milliseconds
    #[arg(short = 'i', long = "interval-ms", default_value = "1000")]
    interval_ms: u64,
    /// The subject to publish to
    #[arg(short = 's', long = "subject", default_value = ORDER_SUBJECT)]
    subject: String,
    /// Index of the first order. Order `n` has the uid `b563feb7b2b84b6test<n>`
    #[arg(long = "start", default_value = "0")]
    start: u32,
}

#[derive(Debug, Args)]
pub struct SampleParams {
    /// Index of the sample order
    #[arg(short = 'n', long = "index", default_value = "0")]
    index: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let result = match cli.command {
        Command::Publish(params) => publish_orders(params).await,
        Command::Sample(params) => print_sample_order(params),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        },
    }
}
