use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sanitation_checklist::config::{AppConfig, StorageBackend};
use sanitation_checklist::error::AppError;
use sanitation_checklist::telemetry;
use sanitation_checklist::workflows::submissions::{
    FileSubmissionStore, InMemorySubmissionStore, SubmissionService, SubmissionStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(data_dir) = args.data_dir.take() {
        config.storage.data_dir = data_dir;
    }

    telemetry::init(&config.telemetry)?;

    match config.storage.backend {
        StorageBackend::Memory => {
            info!("using in-memory submission store");
            serve(config, Arc::new(InMemorySubmissionStore::default())).await
        }
        StorageBackend::File => {
            info!(data_dir = %config.storage.data_dir.display(), "using file submission store");
            let store = FileSubmissionStore::new(config.storage.data_dir.clone());
            serve(config, Arc::new(store)).await
        }
    }
}

async fn serve<S>(config: AppConfig, store: Arc<S>) -> Result<(), AppError>
where
    S: SubmissionStore + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(SubmissionService::new(store));
    let app = with_service_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "sanitation checklist service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
