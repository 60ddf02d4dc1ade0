use std::process::ExitCode;

use dotenvy::dotenv;
use log::*;
use order_ingest_server::{
    cli::handle_command_line_args,
    config::{log_level_from_env, ServerConfig},
    server::run_server,
};

#[actix_web::main]
async fn main() -> ExitCode {
    dotenv().ok();
    if handle_command_line_args() {
        return ExitCode::SUCCESS;
    }
    let _ = env_logger::Builder::new().parse_filters(&log_level_from_env()).try_init();
    let config = match ServerConfig::try_from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("🚀️ {e}");
            return ExitCode::FAILURE;
        },
    };

    info!("🚀️ Starting order ingest gateway on {}:{}", config.host, config.port);
    match run_server(config).await {
        Ok(()) => {
            info!("🚀️ Bye!");
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("🚀️ {e}");
            ExitCode::FAILURE
        },
    }
}
