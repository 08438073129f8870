use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{ProviderConfigRecord, ProviderConfigView, ProviderCredentials, ProviderType};
use super::gateway::{ConnectionReport, GatewayError, PaymentGateway};
use super::repository::ProviderConfigRepository;
use super::validation::{validate_credentials, CredentialError};
use crate::session::TenantId;
use crate::workflows::kariah::RepositoryError;

/// Gatekeeper for payment provider settings: credentials are complete, the
/// gateway accepts them, and at most one provider per tenant is active.
pub struct PaymentProviderService<P, G> {
    configs: Arc<P>,
    gateway: Arc<G>,
}

impl<P, G> PaymentProviderService<P, G>
where
    P: ProviderConfigRepository + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(configs: Arc<P>, gateway: Arc<G>) -> Self {
        Self { configs, gateway }
    }

    pub async fn validate_and_activate(
        &self,
        tenant_id: TenantId,
        provider: ProviderType,
        credentials: &ProviderCredentials,
        is_sandbox: bool,
    ) -> Result<ProviderConfigRecord, PaymentProviderError> {
        let credentials = validate_credentials(provider, credentials)?;

        let report = self
            .gateway
            .test_connection(&credentials, is_sandbox)
            .await
            .map_err(|err| {
                warn!(tenant_id = %tenant_id, provider = %provider, error = %err, "provider connection test failed");
                err
            })?;

        let record = ProviderConfigRecord {
            tenant_id,
            provider,
            credentials,
            is_active: true,
            is_sandbox,
            updated_at: Utc::now(),
        };
        let activation = self.configs.activate_exclusive(record)?;

        for previous in &activation.deactivated {
            info!(
                tenant_id = %activation.record.tenant_id,
                provider = %previous,
                "payment provider deactivated"
            );
        }
        info!(
            tenant_id = %activation.record.tenant_id,
            provider = %provider,
            sandbox = is_sandbox,
            detail = %report.detail,
            "payment provider activated"
        );
        Ok(activation.record)
    }

    /// Completeness and connectivity checks only; nothing is stored.
    pub async fn test_connection(
        &self,
        provider: ProviderType,
        credentials: &ProviderCredentials,
        is_sandbox: bool,
    ) -> Result<ConnectionReport, PaymentProviderError> {
        let credentials = validate_credentials(provider, credentials)?;
        Ok(self.gateway.test_connection(&credentials, is_sandbox).await?)
    }

    pub fn deactivate(
        &self,
        tenant_id: &TenantId,
        provider: ProviderType,
    ) -> Result<ProviderConfigRecord, PaymentProviderError> {
        let mut record = self
            .configs
            .fetch(tenant_id, provider)?
            .ok_or(RepositoryError::NotFound)?;
        if !record.is_active {
            return Ok(record);
        }

        record.is_active = false;
        record.updated_at = Utc::now();
        let stored = self.configs.save(record)?;
        info!(tenant_id = %tenant_id, provider = %provider, "payment provider deactivated");
        Ok(stored)
    }

    pub fn list(&self, tenant_id: &TenantId) -> Result<Vec<ProviderConfigView>, PaymentProviderError> {
        let mut records = self.configs.list(tenant_id)?;
        records.sort_by_key(|record| record.provider);
        Ok(records.iter().map(ProviderConfigRecord::view).collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentProviderError {
    #[error(transparent)]
    Validation(#[from] CredentialError),
    #[error(transparent)]
    Connection(#[from] GatewayError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
