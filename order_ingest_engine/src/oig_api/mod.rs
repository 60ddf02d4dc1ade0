//! The order processing service. [`OrderFlowApi`] sits between the message consumer (or the HTTP routes) and the
//! storage backends, and decides which backend failures are fatal.
mod errors;
mod order_flow_api;

pub use errors::OrderFlowError;
pub use order_flow_api::OrderFlowApi;
