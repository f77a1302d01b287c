//! Nairex exchange backend server.
//!
//! Composition root: builds the metadata store, the ledger engine, the
//! scheduler and webhook dispatcher, wires the services together, bootstraps
//! the per-currency system accounts and serves the API with graceful
//! shutdown.
//!
//! The accept loop runs on hyper-util's connection builder so the keep-alive
//! idle budget applies per connection; the per-request budget is a timeout
//! layer inside the router. Both come from [`config::ServerSettings`].
//!
//! ```bash
//! # Defaults
//! nairex-server
//!
//! # Custom config file and environment overrides
//! NAIREX__SERVER__PORT=9000 nairex-server --config /etc/nairex/config.toml
//! ```

mod config;

use std::pin::pin;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nairex_api::{create_router, ApiConfig, AppState};
use nairex_db::Database;
use nairex_ledger::{InMemoryLedger, LedgerClient};
use nairex_services::{
    AccountService, DepositService, Scheduler, SwapService, WalletService, WebhookDispatcher,
    WithdrawalService,
};
use nairex_types::RateTable;

use crate::config::ServerConfig;

/// Nairex exchange backend
#[derive(Parser, Debug)]
#[command(name = "nairex-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a configuration file (TOML, JSON or YAML)
    #[arg(short, long, env = "NAIREX_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "NAIREX_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "NAIREX_PORT")]
    port: Option<u16>,

    /// Metadata store URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "NAIREX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "NAIREX_LOG_FORMAT")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    if let Some(database_url) = args.database_url {
        server_config.database.url = database_url;
    }
    if let Some(level) = args.log_level {
        server_config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        server_config.logging.format = format;
    }

    init_logging(&server_config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting nairex server");

    let state = build_state(&server_config).await?;
    let app = create_router(
        state,
        ApiConfig { request_timeout: server_config.server.request_timeout() },
    );

    let addr = server_config.server.socket_addr()?;
    tracing::info!(
        host = %server_config.server.host,
        port = server_config.server.port,
        "server listening"
    );

    let listener = TcpListener::bind(addr).await?;
    serve(listener, app, &server_config).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::registry().with(env_filter);
    match config.format.as_str() {
        "json" => subscriber.with(fmt::layer().json().with_target(true)).init(),
        _ => subscriber.with(fmt::layer().pretty().with_target(true)).init(),
    }
    Ok(())
}

/// Construct every process-wide collaborator exactly once and thread them
/// through the services.
async fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    tracing::info!(url = %config.database.url, "connecting metadata store");
    let db = Database::connect(&config.database.url, config.database.max_connections).await?;

    tracing::info!(
        addresses = ?config.ledger.address_list(),
        "starting embedded double-entry ledger engine"
    );
    let ledger: Arc<dyn LedgerClient> = Arc::new(InMemoryLedger::new());

    let scheduler = Scheduler::new();
    let webhooks =
        WebhookDispatcher::new(config.webhook.pre_delay(), config.webhook.deposit_gap());
    let rates = Arc::new(RateTable::default());

    let accounts = AccountService::new(db.clone(), Arc::clone(&ledger));
    let wallets = WalletService::new(db.clone(), Arc::clone(&ledger), accounts.clone());
    wallets.init_system_accounts().await?;

    let swaps = SwapService::new(
        db.clone(),
        Arc::clone(&ledger),
        accounts.clone(),
        wallets.clone(),
        scheduler,
        webhooks.clone(),
        Arc::clone(&rates),
        config.swap.pending_ttl(),
    );
    let withdrawals = WithdrawalService::new(
        db.clone(),
        Arc::clone(&ledger),
        accounts.clone(),
        wallets.clone(),
        webhooks.clone(),
    );
    let deposits = DepositService::new(db, ledger, accounts.clone(), wallets.clone(), webhooks);

    Ok(AppState { accounts, wallets, swaps, withdrawals, deposits, rates })
}

/// Accept loop. Each connection carries the keep-alive idle budget: a
/// connection that sits between requests longer than `idle_timeout` is torn
/// down. Shutdown drains in-flight connections, bounded by the shutdown
/// budget.
async fn serve(listener: TcpListener, app: Router, config: &ServerConfig) -> anyhow::Result<()> {
    let mut builder = ConnectionBuilder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .keep_alive(true)
        .header_read_timeout(config.server.idle_timeout());

    let graceful = GracefulShutdown::new();
    let mut shutdown = pin!(shutdown_signal());

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!(error = %err, "accepting connection");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let app = app.clone();
                let service = service_fn(
                    move |request: hyper::Request<hyper::body::Incoming>| {
                        app.clone().oneshot(request)
                    },
                );
                let connection = builder.serve_connection_with_upgrades(io, service);
                let connection = graceful.watch(connection.into_owned());
                tokio::spawn(async move {
                    if let Err(err) = connection.await {
                        tracing::debug!(peer = %peer, error = %err, "connection closed");
                    }
                });
            }
            _ = shutdown.as_mut() => break,
        }
    }

    tracing::info!(
        timeout_secs = config.server.shutdown_timeout_secs,
        "waiting for in-flight requests to complete..."
    );
    tokio::select! {
        _ = graceful.shutdown() => {
            tracing::info!("all connections drained");
        }
        _ = tokio::time::sleep(config.server.shutdown_timeout()) => {
            tracing::warn!("drain timed out, closing remaining connections");
        }
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown...");
        }
    }
}
