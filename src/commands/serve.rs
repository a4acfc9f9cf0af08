//! HTTP server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

use coderelay::background::BackgroundTasks;
use coderelay::config::Config;
use coderelay::engine::{Engine, ScriptedEngine};
use coderelay::server::{self, AppState};
use coderelay::session::{SessionRegistry, SweeperConfig, spawn_sweeper};
use coderelay::turn::TurnRunner;

pub async fn run(config_path: &str, host: Option<IpAddr>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load(config_path)?;
    if let Some(host) = host {
        config.server.host = host.to_string();
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let engine: Arc<dyn Engine> = Arc::new(ScriptedEngine::new());
    let registry = SessionRegistry::new(
        config.session.workspace_root.clone(),
        config.engine.default_model.clone(),
        config.engine.default_edit_format,
        config.session.max_sessions,
    );
    let background = BackgroundTasks::new();
    let turns = TurnRunner::new(
        Arc::clone(&engine),
        registry.clone(),
        background.clone(),
        Duration::from_secs(config.engine.turn_timeout_seconds),
        config.engine.event_channel_capacity,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_sweeper(
        registry.clone(),
        SweeperConfig {
            period: Duration::from_secs(config.session.sweep_interval_seconds),
            ttl: Duration::from_secs(config.session.ttl_seconds),
        },
        shutdown_rx,
    );

    let state = AppState {
        registry,
        engine,
        turns,
        background: background.clone(),
        default_model: config.engine.default_model.clone(),
        heartbeat_interval_seconds: config.server.heartbeat_interval_seconds,
    };
    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, model = %config.engine.default_model, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight turns finish before stopping the sweeper.
    background.shutdown().await;
    let _ = shutdown_tx.send(true);
    let _ = sweeper.await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
