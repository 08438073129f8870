use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use super::domain::{ApplicationId, ApplicationSubmission, MembershipId};
use super::repository::{
    ApplicationRepository, MembershipRepository, NotificationPublisher, RepositoryError,
};
use super::service::{MembershipService, MembershipServiceError};
use crate::session::{SessionContext, TenantId};
use crate::workflows::http::{error_response, repository_error_response};
use crate::workflows::review::{ReviewCommand, ReviewDecision};

const DEFAULT_QUEUE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct QueueParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartReviewBody {
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

/// Router builder exposing HTTP endpoints for kariah applications and memberships.
pub fn membership_router<R, M, N>(service: Arc<MembershipService<R, M, N>>) -> Router
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenants/:tenant_id/applications",
            post(submit_handler::<R, M, N>).get(queue_handler::<R, M, N>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(status_handler::<R, M, N>).delete(delete_handler::<R, M, N>),
        )
        .route(
            "/api/v1/applications/:application_id/start-review",
            post(start_review_handler::<R, M, N>),
        )
        .route(
            "/api/v1/applications/:application_id/review",
            post(review_handler::<R, M, N>),
        )
        .route(
            "/api/v1/memberships/:membership_id",
            get(membership_handler::<R, M, N>),
        )
        .route(
            "/api/v1/memberships/:membership_id/withdraw",
            post(withdraw_handler::<R, M, N>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R, M, N>(
    State(service): State<Arc<MembershipService<R, M, N>>>,
    session: SessionContext,
    Path(tenant_id): Path<String>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit(
        TenantId(tenant_id),
        session.user_id().clone(),
        submission,
    ) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(MembershipServiceError::Repository(RepositoryError::Duplicate)) => error_response(
            StatusCode::CONFLICT,
            "you have already applied to this mosque; delete the previous application first",
        ),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn queue_handler<R, M, N>(
    State(service): State<Arc<MembershipService<R, M, N>>>,
    session: SessionContext,
    Path(tenant_id): Path<String>,
    Query(params): Query<QueueParams>,
) -> Response
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let tenant_id = TenantId(tenant_id);
    if let Err(rejection) = session.require_admin(&tenant_id) {
        return rejection.into_response();
    }

    let limit = params.limit.unwrap_or(DEFAULT_QUEUE_LIMIT);
    match service.pending_for_tenant(&tenant_id, limit) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.status_view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn status_handler<R, M, N>(
    State(service): State<Arc<MembershipService<R, M, N>>>,
    session: SessionContext,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record)
            if &record.user_id == session.user_id() || session.is_admin_of(&record.tenant_id) =>
        {
            (StatusCode::OK, axum::Json(record.status_view())).into_response()
        }
        Ok(_) => error_response(StatusCode::FORBIDDEN, "not authorized to view this application"),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn delete_handler<R, M, N>(
    State(service): State<Arc<MembershipService<R, M, N>>>,
    session: SessionContext,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.delete_rejected(&ApplicationId(application_id), session.user_id()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn start_review_handler<R, M, N>(
    State(service): State<Arc<MembershipService<R, M, N>>>,
    session: SessionContext,
    Path(application_id): Path<String>,
    axum::Json(body): axum::Json<StartReviewBody>,
) -> Response
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    if let Err(rejection) = session.require_admin(&body.tenant_id) {
        return rejection.into_response();
    }

    match service.start_review(
        &ApplicationId(application_id),
        &body.tenant_id,
        session.user_id(),
    ) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn review_handler<R, M, N>(
    State(service): State<Arc<MembershipService<R, M, N>>>,
    session: SessionContext,
    Path(application_id): Path<String>,
    axum::Json(body): axum::Json<ReviewBody>,
) -> Response
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    if let Err(rejection) = session.require_admin(&body.tenant_id) {
        return rejection.into_response();
    }

    let command = ReviewCommand {
        id: ApplicationId(application_id),
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

pub(crate) async fn membership_handler<R, M, N>(
    State(service): State<Arc<MembershipService<R, M, N>>>,
    session: SessionContext,
    Path(membership_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get_membership(&MembershipId(membership_id)) {
        Ok(record)
            if &record.user_id == session.user_id() || session.is_admin_of(&record.tenant_id) =>
        {
            (StatusCode::OK, axum::Json(record.view())).into_response()
        }
        Ok(_) => error_response(StatusCode::FORBIDDEN, "not authorized to view this membership"),
        Err(other) => service_error_response(other),
    }
}

pub(crate) async fn withdraw_handler<R, M, N>(
    State(service): State<Arc<MembershipService<R, M, N>>>,
    session: SessionContext,
    Path(membership_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.withdraw(&MembershipId(membership_id), session.user_id()) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(other) => service_error_response(other),
    }
}

fn service_error_response(error: MembershipServiceError) -> Response {
    match &error {
        MembershipServiceError::Validation(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        MembershipServiceError::NotAuthorized { .. } => {
            error_response(StatusCode::FORBIDDEN, error.to_string())
        }
        MembershipServiceError::InvalidState { .. } => {
            error_response(StatusCode::CONFLICT, error.to_string())
        }
        MembershipServiceError::Repository(inner) => repository_error_response(inner),
    }
}
