use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use kariah::session::{TenantId, UserId};
use kariah::workflows::kariah::{
    ApplicationId, ApplicationRecord, ApplicationRepository, MembershipId, MembershipRecord,
    MembershipRepository, Notification, NotificationError, NotificationPublisher,
    RepositoryError,
};
use kariah::workflows::khairat::{ClaimId, ClaimRecord, ClaimRepository};
use kariah::workflows::payments::{
    Activation, ProviderConfigRecord, ProviderConfigRepository, ProviderType,
};
use kariah::workflows::review::ReviewableStatus;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
}

/// Compare-and-set on `version`; the stored row gets `version + 1`.
fn bump_version(stored: u64, incoming: &mut u64) -> Result<(), RepositoryError> {
    if stored != *incoming {
        return Err(RepositoryError::StaleVersion {
            expected: *incoming,
            found: stored,
        });
    }
    *incoming += 1;
    Ok(())
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        if guard
            .values()
            .any(|existing| existing.user_id == record.user_id && existing.tenant_id == record.tenant_id)
        {
            return Err(RepositoryError::Duplicate);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        bump_version(stored.version, &mut record.version)?;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        lock(&self.records)?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn pending(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        let mut pending: Vec<_> = guard
            .values()
            .filter(|record| &record.tenant_id == tenant_id && record.status.is_awaiting_review())
            .cloned()
            .collect();
        pending.sort_by_key(|record| record.submitted_at);
        pending.truncate(limit);
        Ok(pending)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryMembershipRepository {
    records: Arc<Mutex<HashMap<MembershipId, MembershipRecord>>>,
}

impl MembershipRepository for InMemoryMembershipRepository {
    fn insert(&self, record: MembershipRecord) -> Result<MembershipRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: MembershipRecord) -> Result<MembershipRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        bump_version(stored.version, &mut record.version)?;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &MembershipId) -> Result<Option<MembershipRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn delete(&self, id: &MembershipId) -> Result<(), RepositoryError> {
        lock(&self.records)?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn active_for(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> Result<Option<MembershipRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|record| {
                &record.user_id == user_id && &record.tenant_id == tenant_id && record.is_active()
            })
            .cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryClaimRepository {
    records: Arc<Mutex<HashMap<ClaimId, ClaimRecord>>>,
}

impl ClaimRepository for InMemoryClaimRepository {
    fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: ClaimRecord) -> Result<ClaimRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        bump_version(stored.version, &mut record.version)?;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ClaimId) -> Result<Option<ClaimRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn pending(&self, tenant_id: &TenantId, limit: usize) -> Result<Vec<ClaimRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        let mut pending: Vec<_> = guard
            .values()
            .filter(|record| &record.tenant_id == tenant_id && record.status.is_awaiting_review())
            .cloned()
            .collect();
        pending.sort_by_key(|record| record.submitted_at);
        pending.truncate(limit);
        Ok(pending)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProviderConfigRepository {
    records: Arc<Mutex<HashMap<(TenantId, ProviderType), ProviderConfigRecord>>>,
}

impl ProviderConfigRepository for InMemoryProviderConfigRepository {
    fn fetch(
        &self,
        tenant_id: &TenantId,
        provider: ProviderType,
    ) -> Result<Option<ProviderConfigRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .get(&(tenant_id.clone(), provider))
            .cloned())
    }

    fn list(&self, tenant_id: &TenantId) -> Result<Vec<ProviderConfigRecord>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|record| &record.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    // One critical section covers the switch-off and the upsert.
    fn activate_exclusive(
        &self,
        mut record: ProviderConfigRecord,
    ) -> Result<Activation, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let mut deactivated = Vec::new();
        for other in guard.values_mut() {
            if other.tenant_id == record.tenant_id
                && other.provider != record.provider
                && other.is_active
            {
                other.is_active = false;
                other.updated_at = record.updated_at;
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
        lock(&self.records)?.insert((record.tenant_id.clone(), record.provider), record.clone());
        Ok(record)
    }
}

/// Stands in for push/email delivery: logs each notification and keeps it for inspection.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationPublisher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for LoggingNotificationPublisher {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            recipient = %notification.recipient,
            tenant_id = %notification.tenant_id,
            template = %notification.template,
            subject_id = %notification.subject_id,
            "notification queued"
        );
        self.events
            .lock()
            .map_err(|_| NotificationError::Transport("notification log lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

#[cfg(test)]
impl LoggingNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}
