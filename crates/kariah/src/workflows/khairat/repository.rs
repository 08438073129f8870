use super::domain::{ClaimId, ClaimRecord};
use crate::session::TenantId;
use crate::workflows::kariah::RepositoryError;

/// Storage abstraction for khairat claims; `update` is compare-and-set on `version`.
pub trait ClaimRepository: Send + Sync {
    fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, RepositoryError>;
    fn update(&self, record: ClaimRecord) -> Result<ClaimRecord, RepositoryError>;
    fn fetch(&self, id: &ClaimId) -> Result<Option<ClaimRecord>, RepositoryError>;
    fn pending(&self, tenant_id: &TenantId, limit: usize)
        -> Result<Vec<ClaimRecord>, RepositoryError>;
}
