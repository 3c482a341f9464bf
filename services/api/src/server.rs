use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::router;
use axum_prometheus::PrometheusMetricLayer;
use hotel_compete::config::AppConfig;
use hotel_compete::error::AppError;
use hotel_compete::session::EngineHandle;
use hotel_compete::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
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

    let engines = Arc::new(EngineHandle::new(config.engine));
    match config.datasets.sources() {
        Some(sources) => {
            // A bad preload is not fatal; datasets can still be posted later.
            if let Err(error) = engines.load(&sources) {
                warn!(%error, "dataset preload failed");
            }
        }
        None => info!("no dataset preload configured; waiting for POST /api/v1/datasets/load"),
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        engines,
    };

    let app = router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(environment = ?config.environment, %addr, "hotel competitiveness service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
