// SPDX-License-Identifier: MIT

//! The Elytra control plane: dataset catalog, connection registry, message
//! router, job coordinator, HTTP+WebSocket surface, and reaper (spec.md
//! §2). Ships as the `elytrad` binary; exposed as a library too so
//! integration tests can drive the Catalog/Registry/Coordinator directly
//! without a real socket.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod reaper;
pub mod registry;
pub mod state;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use catalog::Catalog;
use config::Config;
use coordinator::Coordinator;
use registry::Registry;
use state::AppState;

/// Parse configuration, stand up the control plane, and serve until a
/// shutdown signal arrives. Returns the process exit code (spec.md §6):
/// `0` on a clean shutdown, `1` on a fatal start-up failure.
pub async fn run() -> i32 {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,elytra_server=debug".into()),
        )
        .init();

    let config = Config::parse();

    if let Err(e) = std::fs::create_dir_all(&config.data_root) {
        tracing::error!(error = %e, path = %config.data_root.display(), "failed to create data root");
        return 1;
    }

    let catalog = Arc::new(Catalog::new(config.data_root.clone()));
    match catalog.restore_from_disk() {
        Ok(count) => tracing::info!(count, "restored datasets from disk"),
        Err(e) => tracing::warn!(error = %e, "failed to scan data root for existing datasets"),
    }

    let registry = Arc::new(Registry::new());
    let coordinator = Arc::new(Coordinator::new());
    let state = AppState { catalog: catalog.clone(), registry: registry.clone(), coordinator };

    // Background tasks stop when `background_shutdown` is cancelled, right
    // after the HTTP listener has drained its graceful-shutdown window.
    let background_shutdown = CancellationToken::new();
    spawn_liveness_task(registry.clone(), config.liveness_period(), background_shutdown.clone());
    tokio::spawn(reaper::run(
        catalog,
        config.data_root.clone(),
        config.dataset_max_age(),
        config.reaper_period(),
        background_shutdown.clone(),
    ));

    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind");
            background_shutdown.cancel();
            return 1;
        }
    };

    tracing::info!(%addr, "elytrad listening");
    let serve_result =
        axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;
    background_shutdown.cancel();

    if let Err(e) = serve_result {
        tracing::error!(error = %e, "server exited with an error");
        return 1;
    }
    0
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/register-dataset", post(http::register_dataset))
        .route("/api/datasets", get(http::list_datasets))
        .route("/api/datasets/:id", delete(http::delete_dataset))
        .route("/api/jobs", post(http::submit_job))
        .route("/ws", get(ws::channel_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

fn spawn_liveness_task(registry: Arc<Registry>, period: std::time::Duration, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => registry.sweep_liveness(),
                () = shutdown.cancelled() => return,
            }
        }
    });
}

/// Waits for either Ctrl+C or SIGTERM, whichever the process's host
/// environment sends (spec.md §6's "clean shutdown").
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
