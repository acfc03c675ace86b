use crate::cli::ServeArgs;
use crate::infra::{build_portal, ensure_admin, AppState};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use nagrik_neeti::config::AppConfig;
use nagrik_neeti::error::AppError;
use nagrik_neeti::seed::load_demo_data;
use nagrik_neeti::telemetry;
use std::sync::atomic::Ordering;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (store, portal) = build_portal(&config.backend);
    if args.seed {
        let summary = load_demo_data(store).await?;
        info!(candidates = summary.candidate_ids.len(), "demo catalogue loaded");
    }
    if let Some(uid) = args.admin_uid.as_deref() {
        ensure_admin(&portal, uid).await?;
    }

    let app = with_portal_routes(portal)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "civic transparency portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
