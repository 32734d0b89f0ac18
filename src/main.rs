// src/main.rs

//! `portal-backend`: serves `/health` and `/me` behind bearer token
//! verification, configured from the environment.

use portal_auth::prelude::*;
use portal_auth::server;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_auth=info,portal_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        issuer = %config.issuer,
        jwks_url = %config.jwks_url,
        audience = %config.audience,
        cache_ttl = ?config.cache_ttl,
        "Configuration loaded"
    );

    let verifier = Arc::new(TokenVerifier::from_config(&config)?);
    let app = server::router(verifier);

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address {}: {}", bind_address, e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "portal-backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("portal-backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
