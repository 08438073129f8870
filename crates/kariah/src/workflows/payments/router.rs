use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use super::domain::{ProviderCredentials, ProviderType};
use super::gateway::PaymentGateway;
use super::repository::ProviderConfigRepository;
use super::service::{PaymentProviderError, PaymentProviderService};
use crate::session::{SessionContext, TenantId};
use crate::workflows::http::{error_response, repository_error_response};

#[derive(Debug, Deserialize)]
pub(crate) struct TenantParams {
    tenant_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderBody {
    tenant_id: TenantId,
    provider: ProviderType,
    #[serde(default)]
    credentials: ProviderCredentials,
    #[serde(default)]
    is_sandbox: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeactivateBody {
    tenant_id: TenantId,
    provider: ProviderType,
}

/// Admin endpoints for payment provider settings.
pub fn payment_provider_router<P, G>(service: Arc<PaymentProviderService<P, G>>) -> Router
where
    P: ProviderConfigRepository + 'static,
    G: PaymentGateway + 'static,
{
    Router::new()
        .route(
            "/api/admin/payment-providers",
            get(list_handler::<P, G>).post(activate_handler::<P, G>),
        )
        .route(
            "/api/admin/payment-providers/test",
            post(test_handler::<P, G>),
        )
        .route(
            "/api/admin/payment-providers/deactivate",
            post(deactivate_handler::<P, G>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<P, G>(
    State(service): State<Arc<PaymentProviderService<P, G>>>,
    session: SessionContext,
    Query(params): Query<TenantParams>,
) -> Response
where
    P: ProviderConfigRepository + 'static,
    G: PaymentGateway + 'static,
{
    let tenant_id = TenantId(params.tenant_id);
    if let Err(rejection) = session.require_admin(&tenant_id) {
        return rejection.into_response();
    }

    match service.list(&tenant_id) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn activate_handler<P, G>(
    State(service): State<Arc<PaymentProviderService<P, G>>>,
    session: SessionContext,
    axum::Json(body): axum::Json<ProviderBody>,
) -> Response
where
    P: ProviderConfigRepository + 'static,
    G: PaymentGateway + 'static,
{
    if let Err(rejection) = session.require_admin(&body.tenant_id) {
        return rejection.into_response();
    }

    match service
        .validate_and_activate(body.tenant_id, body.provider, &body.credentials, body.is_sandbox)
        .await
    {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn test_handler<P, G>(
    State(service): State<Arc<PaymentProviderService<P, G>>>,
    session: SessionContext,
    axum::Json(body): axum::Json<ProviderBody>,
) -> Response
where
    P: ProviderConfigRepository + 'static,
    G: PaymentGateway + 'static,
{
    if let Err(rejection) = session.require_admin(&body.tenant_id) {
        return rejection.into_response();
    }

    match service
        .test_connection(body.provider, &body.credentials, body.is_sandbox)
        .await
    {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn deactivate_handler<P, G>(
    State(service): State<Arc<PaymentProviderService<P, G>>>,
    session: SessionContext,
    axum::Json(body): axum::Json<DeactivateBody>,
) -> Response
where
    P: ProviderConfigRepository + 'static,
    G: PaymentGateway + 'static,
{
    if let Err(rejection) = session.require_admin(&body.tenant_id) {
        return rejection.into_response();
    }

    match service.deactivate(&body.tenant_id, body.provider) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

fn service_error_response(error: PaymentProviderError) -> Response {
    match &error {
        PaymentProviderError::Validation(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        PaymentProviderError::Connection(_) => {
            error_response(StatusCode::BAD_GATEWAY, error.to_string())
        }
        PaymentProviderError::Repository(inner) => repository_error_response(inner),
    }
}
