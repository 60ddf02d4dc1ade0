//! Small helpers shared by the Order Ingest Gateway crates.
mod helpers;
mod secret;

pub use helpers::{env_flag, env_or_default, parse_boolean_flag, EnvVarError};
pub use secret::Secret;
