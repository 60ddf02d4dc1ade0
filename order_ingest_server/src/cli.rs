use std::env;

/// Variables listed by the help output. Never list DB_DSN or REDIS_PASSWORD here.
const SHOWN_VARIABLES: [&str; 12] = [
    "LOG_LEVEL",
    "SERVER_HOST",
    "SERVER_PORT",
    "DB_MAX_CONNECTIONS",
    "DB_MIN_CONNECTIONS",
    "REDIS_ADDR",
    "REDIS_DB",
    "NATS_URL",
    "ORDERS_MAX_DELIVERIES",
    "ORDERS_ACK_WAIT_SECS",
    "ORDERS_MAX_IN_FLIGHT",
    "ORDERS_RETRY_BACKOFF_MS",
];

/// The server takes no arguments. Any argument prints the help text and the current configuration instead, and
/// `true` is returned so that the caller can exit.
pub fn handle_command_line_args() -> bool {
    if env::args_os().len() <= 1 {
        return false;
    }
    println!("\n{}\n", include_str!("./cli-help.txt"));
    println!("Configuration in the current environment (secrets are not shown):");
    for name in SHOWN_VARIABLES {
        let value = env::var_os(name)
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_else(|| "(not set, default applies)".into());
        println!("  {name:<25} {value}");
    }
    true
}
