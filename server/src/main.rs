mod app;
mod catalog;
mod config;
mod routes;
mod state;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let data_dir = config::data_dir();
    let dist_dir = config::dist_dir();
    if !dist_dir.is_dir() {
        tracing::warn!(dist_dir = %dist_dir.display(), "client bundle directory missing; only the API will respond");
    }

    let catalog = catalog::scan(&data_dir).await;
    if catalog.event_datasets().next().is_none() {
        tracing::warn!(data_dir = %data_dir.display(), "no event datasets found");
    }
    tracing::info!(
        datasets = catalog.datasets.len(),
        data_dir = %data_dir.display(),
        "Dataset catalog ready"
    );

    let state = AppState::new(catalog);
    let app = app::build_app(state, &dist_dir, &data_dir);

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("hazardmap server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
