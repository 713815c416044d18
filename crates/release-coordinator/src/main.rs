//! Release Coordinator Server
//!
//! Runs the queue workers that orchestrate releases, schedules health and
//! status sweeps, and serves its own liveness endpoints.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use release_coordinator::{
    config::{AppConfig, DatabaseConfig},
    db::{create_pool, init_schema},
    engine::Coordinator,
    handlers,
    queue::{spawn_workers, ChannelQueue},
    state::AppState,
    store::{PgStore, Store},
    ResultExt,
};

/// Initialize tracing/logging.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,release_coordinator=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Build the application router.
fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Run a sweep every `period` until shutdown.
fn spawn_sweep<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    sweep: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = release_coordinator::AppResult<usize>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(Duration::from_secs(1)));
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    if let Ok(count) = sweep().await.log(format!("{} sweep", name)) {
                        tracing::debug!(sweep = name, scheduled = count, "Sweep finished");
                    }
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let app_config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to load app config, using defaults: {}", e);
        AppConfig::default()
    });

    init_tracing(app_config.log_json);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Release Coordinator"
    );

    let db_config = DatabaseConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load database config, using defaults");
        DatabaseConfig::default()
    });

    tracing::info!(
        host = %app_config.host,
        port = app_config.port,
        queue_workers = app_config.queue_workers,
        task_timeout = app_config.task_timeout,
        release_timeout = app_config.release_timeout,
        "Configuration loaded"
    );

    let db_pool = create_pool(&db_config).await?;
    init_schema(&db_pool).await?;

    let app_config = Arc::new(app_config);
    let store: Arc<dyn Store> = Arc::new(PgStore::new(db_pool));
    let (queue, receiver) = ChannelQueue::new();
    let coordinator = Arc::new(Coordinator::new(
        store.clone(),
        Arc::new(queue),
        &app_config,
    )?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut background = spawn_workers(
        app_config.queue_workers,
        receiver,
        coordinator.clone(),
        shutdown_rx.clone(),
    );

    let health_coordinator = coordinator.clone();
    background.push(spawn_sweep(
        "health",
        Duration::from_secs(app_config.health_sweep_interval),
        shutdown_rx.clone(),
        move || {
            let coordinator = health_coordinator.clone();
            async move { coordinator.sweep_health().await }
        },
    ));

    let status_coordinator = coordinator.clone();
    background.push(spawn_sweep(
        "status",
        Duration::from_secs(app_config.status_sweep_interval),
        shutdown_rx,
        move || {
            let coordinator = status_coordinator.clone();
            async move { coordinator.sweep_status().await }
        },
    ));

    let state = AppState::new(store, app_config.clone());
    let app = build_router(state);

    let addr: SocketAddr = app_config.bind_address().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    for handle in background {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
