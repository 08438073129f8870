use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use kariah::config::AppConfig;
use kariah::error::AppError;
use kariah::telemetry;
use kariah::workflows::kariah::MembershipService;
use kariah::workflows::khairat::ClaimService;
use kariah::workflows::payments::{HttpPaymentGateway, PaymentProviderService};
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryClaimRepository,
    InMemoryMembershipRepository, InMemoryProviderConfigRepository, LoggingNotificationPublisher,
};
use crate::routes::{with_workflow_routes, Services};

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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let notifications = Arc::new(LoggingNotificationPublisher::default());
    let gateway = Arc::new(HttpPaymentGateway::new(config.payments.clone())?);
    let services = Services {
        memberships: Arc::new(MembershipService::new(
            Arc::new(InMemoryApplicationRepository::default()),
            Arc::new(InMemoryMembershipRepository::default()),
            notifications.clone(),
        )),
        claims: Arc::new(ClaimService::new(
            Arc::new(InMemoryClaimRepository::default()),
            notifications,
        )),
        providers: Arc::new(PaymentProviderService::new(
            Arc::new(InMemoryProviderConfigRepository::default()),
            gateway,
        )),
    };

    let app = with_workflow_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "kariah administration service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
