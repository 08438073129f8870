use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, ApplicationRecord, MembershipId, MembershipRecord};
use crate::session::{TenantId, UserId};

/// Storage abstraction for kariah applications.
///
/// `update` is a compare-and-set: the stored row must still carry `record.version`,
/// and the returned row carries the incremented version.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
    fn pending(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Storage abstraction for memberships.
///
/// `delete` exists only to discard a membership whose approval could not be saved.
pub trait MembershipRepository: Send + Sync {
    fn insert(&self, record: MembershipRecord) -> Result<MembershipRecord, RepositoryError>;
    fn update(&self, record: MembershipRecord) -> Result<MembershipRecord, RepositoryError>;
    fn fetch(&self, id: &MembershipId) -> Result<Option<MembershipRecord>, RepositoryError>;
    fn delete(&self, id: &MembershipId) -> Result<(), RepositoryError>;
    fn active_for(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> Result<Option<MembershipRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("an application for this user and tenant already exists")]
    Duplicate,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently (expected version {expected}, found {found})")]
    StaleVersion { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (push, e-mail, or in-app inbox adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Notification payload addressed to a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: UserId,
    pub tenant_id: TenantId,
    pub template: String,
    pub subject_id: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
