use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::session::{TenantId, UserId};
use crate::workflows::kariah::{Notification, NotificationError, NotificationPublisher, RepositoryError};
use crate::workflows::khairat::domain::{ClaimId, ClaimRecord, ClaimSubmission};
use crate::workflows::khairat::repository::ClaimRepository;
use crate::workflows::khairat::{claim_router, ClaimService};
use crate::workflows::review::{ReviewCommand, ReviewDecision, ReviewableStatus};

pub(super) type Service = ClaimService<MemoryClaims, MemoryNotifications>;

pub(super) fn tenant() -> TenantId {
    TenantId("M1".to_string())
}

pub(super) fn claimant() -> UserId {
    UserId("user1".to_string())
}

pub(super) fn admin() -> UserId {
    UserId("admin1".to_string())
}

pub(super) fn submission() -> ClaimSubmission {
    ClaimSubmission {
        deceased_name: "Hajah Aminah binti Yusof".to_string(),
        relationship: "mother".to_string(),
        amount_sen: 150_000,
        description: Some("Funeral and burial expenses".to_string()),
    }
}

pub(super) fn review_command(
    id: &ClaimId,
    decision: ReviewDecision,
    notes: Option<&str>,
) -> ReviewCommand<ClaimId> {
    ReviewCommand {
        id: id.clone(),
        tenant_id: tenant(),
        decision,
        reviewer_id: admin(),
        admin_notes: notes.map(str::to_string),
        expected_version: None,
    }
}

pub(super) fn build_service() -> (Service, Arc<MemoryClaims>, Arc<MemoryNotifications>) {
    let claims = Arc::new(MemoryClaims::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = ClaimService::new(claims.clone(), notifications.clone());
    (service, claims, notifications)
}

#[derive(Default, Clone)]
pub(super) struct MemoryClaims {
    records: Arc<Mutex<HashMap<ClaimId, ClaimRecord>>>,
}

impl ClaimRepository for MemoryClaims {
    fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("claims mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: ClaimRecord) -> Result<ClaimRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("claims mutex poisoned");
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

    fn fetch(&self, id: &ClaimId) -> Result<Option<ClaimRecord>, RepositoryError> {
        Ok(self.records.lock().expect("claims mutex poisoned").get(id).cloned())
    }

    fn pending(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<ClaimRecord>, RepositoryError> {
        let guard = self.records.lock().expect("claims mutex poisoned");
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
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub(super) fn templates(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .iter()
            .map(|event| event.template.clone())
            .collect()
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

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: Service) -> axum::Router {
    claim_router(Arc::new(service))
}
