use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use shoe_rental::config::AppConfig;
use shoe_rental::error::AppError;
use shoe_rental::telemetry;
use shoe_rental::workflows::discount::{
    discount_router, ApiKey, ConsistencyChecker, ModelBackedDecider,
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

    telemetry::init(&config.telemetry, config.environment)?;

    let api_key = ApiKey::new(config.access.require_api_key()?);
    config.model.require_api_key()?;
    let decider = ModelBackedDecider::gemini(&config.model)?;
    info!(
        model = %config.model.model,
        timeout_secs = config.model.timeout.as_secs(),
        "discount model client configured"
    );
    let checker = Arc::new(ConsistencyChecker::new(decider));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_service_routes(discount_router(checker, api_key))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "shoe rental discount service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
