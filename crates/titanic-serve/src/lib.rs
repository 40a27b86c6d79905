//! # titanic-serve
//!
//! HTTP endpoint that serves predictions from a model artifact written by
//! `titanic train`.
//!
//! The artifact is loaded once at startup. A missing or corrupt artifact does
//! not stop the process: `/health` keeps answering while `/ready` and
//! `/predict` report `503` until a `POST /reload` succeeds.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

pub use config::{DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, ServeConfig};
pub use error::ApiError;
pub use routes::{HEALTH_ACK, predict_payload, routes};
pub use state::{ModelSlot, ModelState};

/// Loads the model and serves until `shutdown` resolves.
///
/// Fails only if the listener cannot be bound.
pub async fn run_until(
    config: ServeConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<SocketAddr> {
    let slot = Arc::new(ModelSlot::load(&config.model_path));
    info!(
        model = %config.model_path.display(),
        ready = slot.is_ready(),
        "model slot initialised"
    );

    let (addr, server) = warp::serve(routes(slot, config.max_body_bytes))
        .try_bind_with_graceful_shutdown(config.addr(), shutdown)
        .with_context(|| format!("failed to bind {}", config.addr()))?;
    info!(%addr, "listening");

    server.await;
    info!("server stopped");
    Ok(addr)
}

/// Serves until Ctrl-C.
pub async fn run(config: ServeConfig) -> anyhow::Result<()> {
    run_until(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
    })
    .await?;
    Ok(())
}
