//! Per-request caller identity.
//!
//! Authentication happens upstream; the gateway in front of this service forwards the
//! signed-in user and the tenants they administer as headers. Handlers receive the
//! resulting [`SessionContext`] explicitly instead of reading ambient state.

use std::collections::BTreeSet;
use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const USER_HEADER: &str = "x-user-id";
pub const ADMIN_TENANTS_HEADER: &str = "x-admin-tenants";

/// Mosque (tenant) identifier; the unit of data isolation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Identifier of a signed-in user profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the caller for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: UserId,
    admin_tenants: BTreeSet<TenantId>,
}

impl SessionContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            admin_tenants: BTreeSet::new(),
        }
    }

    pub fn with_admin_of(mut self, tenant_id: TenantId) -> Self {
        self.admin_tenants.insert(tenant_id);
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn is_admin_of(&self, tenant_id: &TenantId) -> bool {
        self.admin_tenants.contains(tenant_id)
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, SessionRejection> {
        let user = headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SessionRejection::MissingUser)?;

        let admin_tenants = match headers.get(ADMIN_TENANTS_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| SessionRejection::MalformedAdminTenants)?
                .split(',')
                .map(str::trim)
                .filter(|tenant| !tenant.is_empty())
                .map(|tenant| TenantId(tenant.to_string()))
                .collect(),
            None => BTreeSet::new(),
        };

        Ok(Self {
            user_id: UserId(user.to_string()),
            admin_tenants,
        })
    }

    /// Reject with `403` unless the caller administers `tenant_id`.
    pub fn require_admin(&self, tenant_id: &TenantId) -> Result<(), SessionRejection> {
        if self.is_admin_of(tenant_id) {
            Ok(())
        } else {
            Err(SessionRejection::NotTenantAdmin {
                tenant_id: tenant_id.clone(),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionRejection {
    #[error("missing x-user-id header")]
    MissingUser,
    #[error("x-admin-tenants header is not valid text")]
    MalformedAdminTenants,
    #[error("caller is not an administrator of tenant {tenant_id}")]
    NotTenantAdmin { tenant_id: TenantId },
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        let status = match self {
            SessionRejection::MissingUser | SessionRejection::MalformedAdminTenants => {
                StatusCode::UNAUTHORIZED
            }
            SessionRejection::NotTenantAdmin { .. } => StatusCode::FORBIDDEN,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
