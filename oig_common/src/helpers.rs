use std::{env, fmt::Display, str::FromStr};

use log::*;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {name}: {value}. {reason}")]
pub struct EnvVarError {
    pub name: String,
    pub value: String,
    pub reason: String,
}

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads a boolean flag from the environment variable `name`.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env::var(name).ok(), default)
}

/// Reads and parses the environment variable `name`. If the variable is not set, `default` is returned.
///
/// A variable that is set, but cannot be parsed, is an error rather than a silent fallback to the default.
pub fn env_or_default<T>(name: &str, default: T) -> Result<T, EnvVarError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().map_err(|e| EnvVarError {
            name: name.to_string(),
            value: s.clone(),
            reason: e.to_string(),
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            Ok(default)
        },
    }
}
