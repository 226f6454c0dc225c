//! Hexclaim multiplayer game server.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod protocol;
mod room;
mod server;

use server::{ServerState, DEFAULT_VIEW_RADIUS};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("SERVER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;

    // Radius of the hexagon each new game starts with in view
    let view_radius = match std::env::var("HEXCLAIM_VIEW_RADIUS") {
        Ok(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("HEXCLAIM_VIEW_RADIUS={}: {}", value, e))?,
        Err(_) => DEFAULT_VIEW_RADIUS,
    };

    info!(%addr, view_radius, "starting Hexclaim server");
    server::run_server(addr, Arc::new(ServerState::new(view_radius))).await
}
