use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use nats_tools::NatsClient;
use order_ingest_engine::{OrderFlowApi, OrderStore, PostgresDatabase, RedisOrderCache};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ServerConfig,
    consumer::{nats::NatsBroker, OrderConsumer},
    errors::ServerError,
    routes::configure_routes,
};

/// How long the HTTP server waits for in-flight requests during a graceful shutdown.
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Connects to the database, the cache and the broker, then runs the HTTP server and the order consumer until a
/// shutdown signal arrives or either of them fails.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let mut db = PostgresDatabase::new_with_settings(config.database_url.reveal(), config.pool)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Database connection failed. {e}")))?;
    let cache = RedisOrderCache::connect(&config.redis)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Cache connection failed. {e}")))?;
    let nats = NatsClient::connect(&config.nats)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Broker connection failed. {e}")))?;
    let broker = NatsBroker::new(nats, config.consumer.clone());
    broker.provision().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let consumer =
        OrderConsumer::new(broker, OrderFlowApi::new(db.clone(), cache.clone()), config.consumer_options());
    let srv = create_server_instance(&config, db.clone(), cache)?;
    let handle = srv.handle();
    info!("🚀️ Listening on {}:{}", config.host, config.port);

    let shutdown = CancellationToken::new();
    let consumer_task = consumer.start(shutdown.clone());
    tokio::pin!(consumer_task);
    tokio::pin!(srv);

    let mut consumer_done = false;
    let mut server_done = false;
    let result = tokio::select! {
        _ = shutdown_signal() => {
            info!("🚀️ Shutdown signal received");
            Ok(())
        },
        res = &mut consumer_task => {
            consumer_done = true;
            match res {
                Ok(()) => Err(ServerError::ConsumerError("The order consumer stopped unexpectedly".into())),
                Err(e) => Err(ServerError::ConsumerError(e.to_string())),
            }
        },
        res = &mut srv => {
            server_done = true;
            match res {
                Ok(()) => Err(ServerError::Unspecified("The HTTP server stopped unexpectedly".into())),
                Err(e) => Err(ServerError::from(e)),
            }
        },
    };

    shutdown.cancel();
    if !consumer_done {
        if let Err(e) = consumer_task.await {
            warn!("🚀️ The order consumer reported an error while stopping. {e}");
        }
    }
    if !server_done {
        info!("🚀️ Stopping the HTTP server");
        // The server future must keep being polled for the stop command to complete.
        let (_, res) = tokio::join!(handle.stop(true), &mut srv);
        if let Err(e) = res {
            warn!("🚀️ The HTTP server reported an error while stopping. {e}");
        }
    }
    if let Err(e) = db.close().await {
        warn!("🚀️ Error closing the database pool. {e}");
    }
    result
}

/// Builds the HTTP server. Signal handling is left to the caller, which coordinates the shutdown of the server with
/// the order consumer.
pub fn create_server_instance(
    config: &ServerConfig,
    db: PostgresDatabase,
    cache: RedisOrderCache,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), cache.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("oig::access_log"))
            .app_data(web::Data::new(orders_api))
            .configure(configure_routes::<PostgresDatabase, RedisOrderCache>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .disable_signals()
    .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Resolves on SIGINT or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("🚀️ Could not listen for Ctrl-C. {e}");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                error!("🚀️ Could not listen for SIGTERM. {e}");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
