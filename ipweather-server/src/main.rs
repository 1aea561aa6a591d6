//! Binary crate for the `ipweather-server` HTTP service.
//!
//! This crate focuses on:
//! - Loading configuration (file, then environment, then flags)
//! - Logging setup
//! - Binding the listener and serving until Ctrl-C

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use ipweather_core::{Config, ProviderId, ReqwestFetcher, ServiceId, TemperatureService};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "ipweather-server", version, about = "Temperature at the caller's IP location")]
struct Args {
    /// Config file to use instead of the platform default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. "127.0.0.1:8080".
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env_overrides(|name| std::env::var(name).ok());
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    if !config.is_service_configured(ServiceId::OpenWeather) {
        warn!(
            "{} is not set; every request will fail until it is configured",
            ServiceId::OpenWeather.env_var()
        );
    }
    let http = ReqwestFetcher::new(config.request_timeout())?;
    let addr = config.listen_addr.clone();
    let service = TemperatureService::new(config, Arc::new(http));
    info!(provider = %ProviderId::select(service.config()), "coordinate provider");

    let app = ipweather_server::router(service);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind listener on {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
