use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use super::domain::{ClaimId, ClaimSubmission};
use super::repository::ClaimRepository;
use super::service::{ClaimService, ClaimServiceError};
use crate::session::{SessionContext, TenantId};
use crate::workflows::http::{error_response, repository_error_response};
use crate::workflows::kariah::NotificationPublisher;
use crate::workflows::review::{ReviewCommand, ReviewDecision};

const DEFAULT_QUEUE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct QueueParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TenantBody {
    tenant_id: TenantId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewBody {
    tenant_id: TenantId,
    status: ReviewDecision,
    #[serde(default)]
    admin_notes: Option<String>,
    #[serde(default)]
    expected_version: Option<u64>,
}

/// Router builder exposing HTTP endpoints for khairat claims.
pub fn claim_router<C, N>(service: Arc<ClaimService<C, N>>) -> Router
where
    C: ClaimRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenants/:tenant_id/claims",
            post(submit_handler::<C, N>).get(queue_handler::<C, N>),
        )
        .route("/api/v1/claims/:claim_id", get(status_handler::<C, N>))
        .route(
            "/api/v1/claims/:claim_id/start-review",
            post(start_review_handler::<C, N>),
        )
        .route("/api/v1/claims/:claim_id/review", post(review_handler::<C, N>))
        .route("/api/v1/claims/:claim_id/pay", post(pay_handler::<C, N>))
        .route("/api/v1/claims/:claim_id/cancel", post(cancel_handler::<C, N>))
        .with_state(service)
}

pub(crate) async fn submit_handler<C, N>(
    State(service): State<Arc<ClaimService<C, N>>>,
    session: SessionContext,
    Path(tenant_id): Path<String>,
    axum::Json(submission): axum::Json<ClaimSubmission>,
) -> Response
where
    C: ClaimRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit(TenantId(tenant_id), session.user_id().clone(), submission) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn queue_handler<C, N>(
    State(service): State<Arc<ClaimService<C, N>>>,
    session: SessionContext,
    Path(tenant_id): Path<String>,
    Query(params): Query<QueueParams>,
) -> Response
where
    C: ClaimRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let tenant_id = TenantId(tenant_id);
    if let Err(rejection) = session.require_admin(&tenant_id) {
        return rejection.into_response();
    }

    match service.pending_for_tenant(&tenant_id, params.limit.unwrap_or(DEFAULT_QUEUE_LIMIT)) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.status_view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn status_handler<C, N>(
    State(service): State<Arc<ClaimService<C, N>>>,
    session: SessionContext,
    Path(claim_id): Path<String>,
) -> Response
where
    C: ClaimRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&ClaimId(claim_id)) {
        Ok(record)
            if &record.claimant_id == session.user_id()
                || session.is_admin_of(&record.tenant_id) =>
        {
            (StatusCode::OK, axum::Json(record.status_view())).into_response()
        }
        Ok(_) => error_response(StatusCode::FORBIDDEN, "not authorized to view this claim"),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn start_review_handler<C, N>(
    State(service): State<Arc<ClaimService<C, N>>>,
    session: SessionContext,
    Path(claim_id): Path<String>,
    axum::Json(body): axum::Json<TenantBody>,
) -> Response
where
    C: ClaimRepository + 'static,
    N: NotificationPublisher + 'static,
{
    if let Err(rejection) = session.require_admin(&body.tenant_id) {
        return rejection.into_response();
    }

    match service.start_review(&ClaimId(claim_id), &body.tenant_id, session.user_id()) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn review_handler<C, N>(
    State(service): State<Arc<ClaimService<C, N>>>,
    session: SessionContext,
    Path(claim_id): Path<String>,
    axum::Json(body): axum::Json<ReviewBody>,
) -> Response
where
    C: ClaimRepository + 'static,
    N: NotificationPublisher + 'static,
{
    if let Err(rejection) = session.require_admin(&body.tenant_id) {
        return rejection.into_response();
    }

    let command = ReviewCommand {
        id: ClaimId(claim_id),
        tenant_id: body.tenant_id,
        decision: body.status,
        reviewer_id: session.user_id().clone(),
        admin_notes: body.admin_notes,
        expected_version: body.expected_version,
    };

    match service.review(command) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn pay_handler<C, N>(
    State(service): State<Arc<ClaimService<C, N>>>,
    session: SessionContext,
    Path(claim_id): Path<String>,
    axum::Json(body): axum::Json<TenantBody>,
) -> Response
where
    C: ClaimRepository + 'static,
    N: NotificationPublisher + 'static,
{
    if let Err(rejection) = session.require_admin(&body.tenant_id) {
        return rejection.into_response();
    }

    match service.mark_paid(&ClaimId(claim_id), &body.tenant_id, session.user_id()) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn cancel_handler<C, N>(
    State(service): State<Arc<ClaimService<C, N>>>,
    session: SessionContext,
    Path(claim_id): Path<String>,
) -> Response
where
    C: ClaimRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.cancel(&ClaimId(claim_id), session.user_id()) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

fn service_error_response(error: ClaimServiceError) -> Response {
    match &error {
        ClaimServiceError::Validation(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        ClaimServiceError::NotAuthorized { .. } => {
            error_response(StatusCode::FORBIDDEN, error.to_string())
        }
        ClaimServiceError::InvalidState { .. } => {
            error_response(StatusCode::CONFLICT, error.to_string())
        }
        ClaimServiceError::Repository(inner) => repository_error_response(inner),
    }
}
