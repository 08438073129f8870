use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::session::{TenantId, UserId};
use crate::workflows::kariah::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, MembershipId,
    MembershipRecord,
};
use crate::workflows::kariah::repository::{
    ApplicationRepository, MembershipRepository, Notification, NotificationError,
    NotificationPublisher, RepositoryError,
};
use crate::workflows::kariah::{membership_router, MembershipService};
use crate::workflows::review::{ReviewCommand, ReviewDecision};

pub(super) type Service = MembershipService<MemoryApplications, MemoryMemberships, MemoryNotifications>;

pub(super) fn tenant() -> TenantId {
    TenantId("M1".to_string())
}

pub(super) fn user() -> UserId {
    UserId("user1".to_string())
}

pub(super) fn admin() -> UserId {
    UserId("admin1".to_string())
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        full_name: "Ahmad bin Ismail".to_string(),
        ic_number: "900101-01-1234".to_string(),
        phone: "012-345 6789".to_string(),
        address: "12 Jalan Masjid, Kampung Baru".to_string(),
        occupation: Some("Teacher".to_string()),
        dependents: 3,
    }
}

pub(super) fn review_command(
    id: &ApplicationId,
    decision: ReviewDecision,
    notes: Option<&str>,
) -> ReviewCommand<ApplicationId> {
    ReviewCommand {
        id: id.clone(),
        tenant_id: tenant(),
        decision,
        reviewer_id: admin(),
        admin_notes: notes.map(str::to_string),
        expected_version: None,
    }
}

pub(super) fn build_service() -> (
    Service,
    Arc<MemoryApplications>,
    Arc<MemoryMemberships>,
    Arc<MemoryNotifications>,
) {
    let applications = Arc::new(MemoryApplications::default());
    let memberships = Arc::new(MemoryMemberships::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = MembershipService::new(
        applications.clone(),
        memberships.clone(),
        notifications.clone(),
    );
    (service, applications, memberships, notifications)
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != record.version {
            return Err(RepositoryError::StaleVersion {
                expected: record.version,
                found: stored.version,
            });
        }
        record.version += 1;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn pending(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut pending: Vec<_> = guard
            .values()
            .filter(|record| {
                &record.tenant_id == tenant_id
                    && matches!(
                        record.status,
                        ApplicationStatus::Pending | ApplicationStatus::UnderReview
                    )
            })
            .cloned()
            .collect();
        pending.sort_by_key(|record| record.submitted_at);
        pending.truncate(limit);
        Ok(pending)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryMemberships {
    pub(super) records: Arc<Mutex<HashMap<MembershipId, MembershipRecord>>>,
}

impl MemoryMemberships {
    pub(super) fn all(&self) -> Vec<MembershipRecord> {
        self.records
            .lock()
            .expect("membership mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

impl MembershipRepository for MemoryMemberships {
    fn insert(&self, record: MembershipRecord) -> Result<MembershipRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("membership mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: MembershipRecord) -> Result<MembershipRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("membership mutex poisoned");
        let stored = guard.get(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != record.version {
            return Err(RepositoryError::StaleVersion {
                expected: record.version,
                found: stored.version,
            });
        }
        record.version += 1;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &MembershipId) -> Result<Option<MembershipRecord>, RepositoryError> {
        let guard = self.records.lock().expect("membership mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &MembershipId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("membership mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn active_for(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> Result<Option<MembershipRecord>, RepositoryError> {
        let guard = self.records.lock().expect("membership mutex poisoned");
        Ok(guard
            .values()
            .find(|record| {
                &record.user_id == user_id && &record.tenant_id == tenant_id && record.is_active()
            })
            .cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Membership store that refuses every insert.
#[derive(Default)]
pub(super) struct RejectingMemberships {
    pub(super) inner: MemoryMemberships,
}

impl MembershipRepository for RejectingMemberships {
    fn insert(&self, _record: MembershipRecord) -> Result<MembershipRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("membership table locked".to_string()))
    }

    fn update(&self, record: MembershipRecord) -> Result<MembershipRecord, RepositoryError> {
        self.inner.update(record)
    }

    fn fetch(&self, id: &MembershipId) -> Result<Option<MembershipRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn delete(&self, id: &MembershipId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }

    fn active_for(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> Result<Option<MembershipRecord>, RepositoryError> {
        self.inner.active_for(user_id, tenant_id)
    }
}

/// Application store whose updates or deletes can be switched off mid-test.
#[derive(Default)]
pub(super) struct FlakyApplications {
    pub(super) inner: MemoryApplications,
    pub(super) fail_updates: AtomicBool,
    pub(super) fail_deletes: AtomicBool,
}

impl ApplicationRepository for FlakyApplications {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("write timeout".to_string()));
        }
        self.inner.update(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("write timeout".to_string()));
        }
        self.inner.delete(id)
    }

    fn pending(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.inner.pending(tenant_id, limit)
    }
}

pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("push provider offline".to_string()))
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &ApplicationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(
        &self,
        _tenant_id: &TenantId,
        _limit: usize,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: Service) -> axum::Router {
    membership_router(Arc::new(service))
}
