// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! anneald: the optimization job server daemon.

use std::sync::Arc;

use anneal_core::SystemClock;
use anneal_optimizer::SearchDriver;
use anneal_storage::{JobStore, MemoryStore, SqliteStore, StoreError};
use anneal_server::http::Registry;
use anneal_server::{router, AppState, JobRegistry, Metrics, Settings, StoreKind};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum ServeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "anneald exited with error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServeError> {
    let settings = Arc::new(Settings::from_env());

    let store: Arc<dyn JobStore> = match settings.job_store {
        StoreKind::Sqlite => Arc::new(
            SqliteStore::create(&settings.sqlite_path, settings.sse_buffer_size).await?,
        ),
        StoreKind::Memory => Arc::new(MemoryStore::new(settings.sse_buffer_size)),
    };

    let metrics = Arc::new(Metrics::new());
    let registry = Arc::new(JobRegistry::new(
        Arc::clone(&settings),
        Arc::clone(&store),
        Arc::new(SearchDriver::new()),
        SystemClock,
        Arc::clone(&metrics),
    ));
    tokio::spawn(Arc::clone(&registry).reaper_loop());

    let state = AppState::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        Arc::clone(&settings),
        metrics,
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "anneald listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&registry)))
        .await?;

    store.close().await?;
    Ok(())
}

async fn shutdown_signal(registry: Arc<Registry>) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("shutdown signal received");
    registry.shutdown().await;
}
