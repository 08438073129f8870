use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use kariah::workflows::kariah::{
    membership_router, ApplicationRepository, MembershipRepository, MembershipService,
    NotificationPublisher,
};
use kariah::workflows::khairat::{claim_router, ClaimRepository, ClaimService};
use kariah::workflows::payments::{
    payment_provider_router, PaymentGateway, PaymentProviderService, ProviderConfigRepository,
};
use serde_json::json;

use crate::infra::AppState;

/// The three workflow services mounted by the HTTP app.
pub(crate) struct Services<R, M, N, C, P, G> {
    pub(crate) memberships: Arc<MembershipService<R, M, N>>,
    pub(crate) claims: Arc<ClaimService<C, N>>,
    pub(crate) providers: Arc<PaymentProviderService<P, G>>,
}

pub(crate) fn with_workflow_routes<R, M, N, C, P, G>(services: Services<R, M, N, C, P, G>) -> Router
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
    C: ClaimRepository + 'static,
    P: ProviderConfigRepository + 'static,
    G: PaymentGateway + 'static,
{
    membership_router(services.memberships)
        .merge(claim_router(services.claims))
        .merge(payment_provider_router(services.providers))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Relaxed) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
