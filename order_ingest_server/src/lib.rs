//! # Order ingest server
//!
//! The process around the order ingest engine. It
//! * reads its configuration from the environment ([`config`]),
//! * consumes orders from NATS JetStream and feeds them to the processing service ([`consumer`]),
//! * serves a small HTTP surface ([`routes`]),
//! * and coordinates startup and graceful shutdown ([`server`]).
//!
//! ## Routes
//! * `GET /live`: liveness probe, always `200 {"status":"ok"}`.
//! * `GET /orders/{order_uid}`: the order, via the cache when possible.
pub mod cli;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
