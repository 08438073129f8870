use super::domain::{ProviderConfigRecord, ProviderType};
use crate::session::TenantId;
use crate::workflows::kariah::RepositoryError;

/// Result of an exclusive activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub record: ProviderConfigRecord,
    /// Providers of the same tenant that were switched off.
    pub deactivated: Vec<ProviderType>,
}

/// Storage abstraction for per-tenant payment provider settings.
pub trait ProviderConfigRepository: Send + Sync {
    fn fetch(
        &self,
        tenant_id: &TenantId,
        provider: ProviderType,
    ) -> Result<Option<ProviderConfigRecord>, RepositoryError>;

    fn list(&self, tenant_id: &TenantId) -> Result<Vec<ProviderConfigRecord>, RepositoryError>;

    /// Upsert `record` as active and switch off every other provider of the
    /// tenant in one step. On error nothing is changed.
    fn activate_exclusive(&self, record: ProviderConfigRecord)
        -> Result<Activation, RepositoryError>;

    /// Upsert without touching other providers.
    fn save(&self, record: ProviderConfigRecord) -> Result<ProviderConfigRecord, RepositoryError>;
}
