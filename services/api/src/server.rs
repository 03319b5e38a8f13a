use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_ops_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hireboard::config::{AppConfig, StorageBackend};
use hireboard::error::AppError;
use hireboard::store::{MemoryStore, SqliteStore, Store};
use hireboard::{hireboard_router, telemetry, Hireboard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.uses_development_secret() {
        warn!("APP_JWT_SECRET is not set; signing sessions with the development secret");
    }

    match config.storage.backend {
        StorageBackend::Memory => serve_with(config, Arc::new(MemoryStore::default())).await,
        StorageBackend::Sqlite => {
            let store = SqliteStore::open(&config.storage.database_path)?;
            info!(path = %config.storage.database_path.display(), "sqlite store opened");
            serve_with(config, Arc::new(store)).await
        }
    }
}

async fn serve_with<S>(config: AppConfig, store: Arc<S>) -> Result<(), AppError>
where
    S: Store + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let hireboard = Arc::new(Hireboard::new(store, &config.auth, config.pipeline)?);

    let app = with_ops_routes(hireboard_router(hireboard))
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        ?config.storage.backend,
        ?config.pipeline,
        %addr,
        "hireboard api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
