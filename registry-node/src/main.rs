mod config;
mod error;
mod health;
mod startup;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::health::HealthState;

/// A node in the write-coordination cluster: wires storage, the journal, and
/// the core's Consumer Loop together, then serves health probes until a
/// shutdown signal arrives (§4.J).
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory containing `base.{yaml,toml,json}` and an optional
    /// `{APP_ENV}.*` overlay (§4.J).
    #[arg(long = "config-dir", env = "REGISTRY_NODE_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let args = Args::parse();
    let settings = config::load_settings(args.config_dir).context("loading configuration")?;

    tracing::info!(address = %settings.application.address(), "starting registry node");

    let (engine, consumer) = startup::build_engine(&settings).await?;
    let readiness = engine.consumer_loop.readiness();

    let consumer_loop = engine.consumer_loop.clone();
    let consumer_task = tokio::spawn(async move { consumer_loop.run(consumer).await });

    let health_state = Arc::new(HealthState::new(readiness, settings.application.heartbeat_staleness()));
    let app = Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .with_state(health_state);

    let listener = tokio::net::TcpListener::bind(settings.application.address())
        .await
        .context("binding to port")?;

    tracing::info!(address = %settings.application.address(), "registry node listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    engine.core.shutdown();
    consumer_task.abort();

    tracing::info!("registry node shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, stopping registry node");
}
