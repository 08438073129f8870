use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::session::TenantId;
use crate::workflows::kariah::RepositoryError;
use crate::workflows::payments::domain::{
    GatewayCredentials, ProviderConfigRecord, ProviderCredentials, ProviderType,
};
use crate::workflows::payments::gateway::{ConnectionReport, GatewayError, PaymentGateway};
use crate::workflows::payments::repository::{Activation, ProviderConfigRepository};
use crate::workflows::payments::{payment_provider_router, PaymentProviderService};

pub(super) type Service = PaymentProviderService<MemoryProviderConfigs, RecordingGateway>;

pub(super) fn tenant() -> TenantId {
    TenantId("mosqueA".to_string())
}

pub(super) fn billplz_credentials() -> ProviderCredentials {
    ProviderCredentials {
        api_key: Some("73eb57f0-7d4e-42b9-a544-aeac6e4b0f81".to_string()),
        collection_id: Some("inbmmepb".to_string()),
        x_signature_key: Some("S-0Sq67GFD9Y5iXmi5iXaKtp".to_string()),
        ..ProviderCredentials::default()
    }
}

pub(super) fn toyyibpay_credentials() -> ProviderCredentials {
    ProviderCredentials {
        secret_key: Some("w5x7srq7-rx5r-3t89-1w1g-d9f1s1t1c4ra".to_string()),
        category_code: Some("gcbhict9".to_string()),
        ..ProviderCredentials::default()
    }
}

pub(super) fn build_service(
    gateway: RecordingGateway,
) -> (Service, Arc<MemoryProviderConfigs>, Arc<RecordingGateway>) {
    let configs = Arc::new(MemoryProviderConfigs::default());
    let gateway = Arc::new(gateway);
    let service = PaymentProviderService::new(configs.clone(), gateway.clone());
    (service, configs, gateway)
}

#[derive(Default, Clone)]
pub(super) struct MemoryProviderConfigs {
    records: Arc<Mutex<HashMap<(TenantId, ProviderType), ProviderConfigRecord>>>,
}

impl MemoryProviderConfigs {
    pub(super) fn active_providers(&self, tenant_id: &TenantId) -> Vec<ProviderType> {
        let mut active: Vec<_> = self
            .records
            .lock()
            .expect("provider mutex poisoned")
            .values()
            .filter(|record| &record.tenant_id == tenant_id && record.is_active)
            .map(|record| record.provider)
            .collect();
        active.sort();
        active
    }

    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("provider mutex poisoned").len()
    }
}

impl ProviderConfigRepository for MemoryProviderConfigs {
    fn fetch(
        &self,
        tenant_id: &TenantId,
        provider: ProviderType,
    ) -> Result<Option<ProviderConfigRecord>, RepositoryError> {
        let guard = self.records.lock().expect("provider mutex poisoned");
        Ok(guard.get(&(tenant_id.clone(), provider)).cloned())
    }

    fn list(&self, tenant_id: &TenantId) -> Result<Vec<ProviderConfigRecord>, RepositoryError> {
        let guard = self.records.lock().expect("provider mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn activate_exclusive(
        &self,
        mut record: ProviderConfigRecord,
    ) -> Result<Activation, RepositoryError> {
        let mut guard = self.records.lock().expect("provider mutex poisoned");
        let mut deactivated = Vec::new();
        for other in guard.values_mut() {
            if other.tenant_id == record.tenant_id && other.provider != record.provider && other.is_active {
                other.is_active = false;
                deactivated.push(other.provider);
            }
        }
        record.is_active = true;
        guard.insert((record.tenant_id.clone(), record.provider), record.clone());
        Ok(Activation {
            record,
            deactivated,
        })
    }

    fn save(&self, record: ProviderConfigRecord) -> Result<ProviderConfigRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("provider mutex poisoned");
        guard.insert((record.tenant_id.clone(), record.provider), record.clone());
        Ok(record)
    }
}

pub(super) struct UnavailableConfigs;

impl ProviderConfigRepository for UnavailableConfigs {
    fn fetch(
        &self,
        _tenant_id: &TenantId,
        _provider: ProviderType,
    ) -> Result<Option<ProviderConfigRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _tenant_id: &TenantId) -> Result<Vec<ProviderConfigRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn activate_exclusive(
        &self,
        _record: ProviderConfigRecord,
    ) -> Result<Activation, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save(&self, _record: ProviderConfigRecord) -> Result<ProviderConfigRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Gateway double that records every call and answers with a fixed outcome.
pub(super) struct RecordingGateway {
    calls: Mutex<Vec<(ProviderType, bool)>>,
    rejection: Option<String>,
}

impl RecordingGateway {
    pub(super) fn accepting() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            rejection: None,
        }
    }

    pub(super) fn rejecting(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            rejection: Some(message.to_string()),
        }
    }

    pub(super) fn calls(&self) -> Vec<(ProviderType, bool)> {
        self.calls.lock().expect("gateway mutex poisoned").clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn test_connection(
        &self,
        credentials: &GatewayCredentials,
        is_sandbox: bool,
    ) -> Result<ConnectionReport, GatewayError> {
        let provider = credentials.provider();
        self.calls
            .lock()
            .expect("gateway mutex poisoned")
            .push((provider, is_sandbox));

        match &self.rejection {
            Some(message) => Err(GatewayError::Rejected {
                provider,
                message: message.clone(),
            }),
            None => Ok(ConnectionReport {
                provider,
                is_sandbox,
                detail: "Tabung Masjid".to_string(),
            }),
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 8192)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: Service) -> axum::Router {
    payment_provider_router(Arc::new(service))
}
