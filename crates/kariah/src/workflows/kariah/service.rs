use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, MembershipId,
    MembershipRecord, MembershipStatus,
};
use super::intake::IntakeGuard;
use super::repository::{
    ApplicationRepository, MembershipRepository, Notification, NotificationPublisher,
    RepositoryError,
};
use crate::session::{TenantId, UserId};
use crate::workflows::review::{
    ensure_transition, review_transition, ReviewCommand, ReviewDecision, ReviewError,
    ValidationError,
};

/// Service composing intake validation, the review rules, and membership storage.
pub struct MembershipService<R, M, N> {
    guard: IntakeGuard,
    applications: Arc<R>,
    memberships: Arc<M>,
    notifications: Arc<N>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static MEMBERSHIP_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("kariah-{id:06}"))
}

fn next_membership_id() -> MembershipId {
    let id = MEMBERSHIP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MembershipId(format!("mbr-{id:06}"))
}

impl<R, M, N> MembershipService<R, M, N>
where
    R: ApplicationRepository + 'static,
    M: MembershipRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(applications: Arc<R>, memberships: Arc<M>, notifications: Arc<N>) -> Self {
        Self {
            guard: IntakeGuard,
            applications,
            memberships,
            notifications,
        }
    }

    /// Submit a new application; it starts out `pending`.
    pub fn submit(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationRecord, MembershipServiceError> {
        let applicant = self.guard.applicant_from_submission(submission)?;

        if self.memberships.active_for(&user_id, &tenant_id)?.is_some() {
            return Err(MembershipServiceError::InvalidState {
                detail: format!("user {user_id} is already an active member of {tenant_id}"),
            });
        }

        let record = ApplicationRecord {
            id: next_application_id(),
            user_id,
            tenant_id,
            applicant,
            status: ApplicationStatus::Pending,
            submitted_at: Utc::now(),
            reviewed_by: None,
            reviewed_at: None,
            admin_notes: None,
            membership_id: None,
            version: 1,
        };

        let stored = self.applications.insert(record)?;
        info!(
            application_id = %stored.id.0,
            tenant_id = %stored.tenant_id,
            "kariah application submitted"
        );
        Ok(stored)
    }

    /// Move a pending application into `under_review`.
    pub fn start_review(
        &self,
        application_id: &ApplicationId,
        tenant_id: &TenantId,
        reviewer_id: &UserId,
    ) -> Result<ApplicationRecord, MembershipServiceError> {
        let mut record = self.load_for_tenant(application_id, tenant_id)?;
        record.status = ensure_transition(record.status, ApplicationStatus::UnderReview)?;

        let stored = self.applications.update(record)?;
        info!(
            application_id = %stored.id.0,
            reviewer = %reviewer_id,
            "kariah application under review"
        );
        Ok(stored)
    }

    /// Approve or reject an application awaiting review.
    ///
    /// Approval also opens an active membership. The applicant is notified either
    /// way; a failed notification is logged and does not undo the review.
    pub fn review(
        &self,
        command: ReviewCommand<ApplicationId>,
    ) -> Result<ApplicationRecord, MembershipServiceError> {
        let ReviewCommand {
            id,
            tenant_id,
            decision,
            reviewer_id,
            admin_notes,
            expected_version,
        } = command;

        let mut record = self.load_for_tenant(&id, &tenant_id)?;
        if let Some(expected) = expected_version {
            if expected != record.version {
                return Err(RepositoryError::StaleVersion {
                    expected,
                    found: record.version,
                }
                .into());
            }
        }

        let outcome = review_transition(record.status, decision, admin_notes.as_deref())?;
        record.status = outcome.status;
        record.admin_notes = outcome.admin_notes;
        record.reviewed_by = Some(reviewer_id.clone());
        record.reviewed_at = Some(Utc::now());

        // The membership row goes in first so an approved application never
        // points at a membership that does not exist.
        let opened = if decision == ReviewDecision::Approved {
            let membership = self.memberships.insert(MembershipRecord {
                id: next_membership_id(),
                application_id: record.id.clone(),
                user_id: record.user_id.clone(),
                tenant_id: record.tenant_id.clone(),
                status: MembershipStatus::Active,
                joined_at: Utc::now(),
                withdrawn_at: None,
                version: 1,
            })?;
            record.membership_id = Some(membership.id.clone());
            Some(membership)
        } else {
            None
        };

        let stored = match self.applications.update(record) {
            Ok(stored) => stored,
            Err(err) => {
                if let Some(membership) = &opened {
                    self.discard_membership(&membership.id);
                }
                return Err(err.into());
            }
        };

        if let Some(membership) = &opened {
            info!(membership_id = %membership.id.0, "kariah membership opened");
        }

        info!(
            application_id = %stored.id.0,
            reviewer = %reviewer_id,
            decision = decision.label(),
            "kariah application reviewed"
        );
        self.notify_applicant(&stored, decision);
        Ok(stored)
    }

    /// Owner-initiated withdrawal of an active membership.
    ///
    /// The originating application row is deleted so the user may apply again.
    pub fn withdraw(
        &self,
        membership_id: &MembershipId,
        owner_id: &UserId,
    ) -> Result<MembershipRecord, MembershipServiceError> {
        let mut membership = self
            .memberships
            .fetch(membership_id)?
            .ok_or(RepositoryError::NotFound)?;

        if &membership.user_id != owner_id {
            return Err(MembershipServiceError::NotAuthorized {
                action: "withdraw this membership",
            });
        }
        if !membership.is_active() {
            return Err(MembershipServiceError::InvalidState {
                detail: format!(
                    "membership is {} and cannot be withdrawn",
                    membership.status.label()
                ),
            });
        }

        // Application first: if this fails the membership is still active and
        // the withdrawal can be retried.
        match self.applications.delete(&membership.application_id) {
            Ok(()) | Err(RepositoryError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        membership.status = MembershipStatus::Withdrawn;
        membership.withdrawn_at = Some(Utc::now());
        let stored = self.memberships.update(membership)?;

        info!(
            membership_id = %stored.id.0,
            tenant_id = %stored.tenant_id,
            "kariah membership withdrawn"
        );
        Ok(stored)
    }

    /// Owner-initiated removal of a rejected application, allowing resubmission.
    pub fn delete_rejected(
        &self,
        application_id: &ApplicationId,
        owner_id: &UserId,
    ) -> Result<(), MembershipServiceError> {
        let record = self
            .applications
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;

        if &record.user_id != owner_id {
            return Err(MembershipServiceError::NotAuthorized {
                action: "delete this application",
            });
        }
        if record.status != ApplicationStatus::Rejected {
            return Err(MembershipServiceError::InvalidState {
                detail: "only rejected applications can be deleted".to_string(),
            });
        }

        self.applications.delete(application_id)?;
        info!(application_id = %application_id.0, "rejected kariah application deleted");
        Ok(())
    }

    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, MembershipServiceError> {
        let record = self
            .applications
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn get_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<MembershipRecord, MembershipServiceError> {
        let record = self
            .memberships
            .fetch(membership_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Applications awaiting a decision for the admin queue, oldest first.
    pub fn pending_for_tenant(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<ApplicationRecord>, MembershipServiceError> {
        Ok(self.applications.pending(tenant_id, limit)?)
    }

    fn load_for_tenant(
        &self,
        application_id: &ApplicationId,
        tenant_id: &TenantId,
    ) -> Result<ApplicationRecord, MembershipServiceError> {
        let record = self
            .applications
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        if &record.tenant_id != tenant_id {
            return Err(MembershipServiceError::NotAuthorized {
                action: "review applications of another tenant",
            });
        }
        Ok(record)
    }

    fn discard_membership(&self, membership_id: &MembershipId) {
        if let Err(err) = self.memberships.delete(membership_id) {
            warn!(
                membership_id = %membership_id.0,
                error = %err,
                "failed to discard membership after aborted approval"
            );
        }
    }

    fn notify_applicant(&self, record: &ApplicationRecord, decision: ReviewDecision) {
        let mut details = BTreeMap::new();
        details.insert("decision".to_string(), decision.label().to_string());
        if let Some(notes) = &record.admin_notes {
            details.insert("admin_notes".to_string(), notes.clone());
        }

        let notification = Notification {
            recipient: record.user_id.clone(),
            tenant_id: record.tenant_id.clone(),
            template: format!("kariah_application_{}", decision.label()),
            subject_id: record.id.0.clone(),
            details,
        };

        if let Err(err) = self.notifications.publish(notification) {
            warn!(application_id = %record.id.0, error = %err, "applicant notification failed");
        }
    }
}

/// Error raised by the membership service.
#[derive(Debug, thiserror::Error)]
pub enum MembershipServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not authorized to {action}")]
    NotAuthorized { action: &'static str },
    #[error("invalid state: {detail}")]
    InvalidState { detail: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ReviewError> for MembershipServiceError {
    fn from(value: ReviewError) -> Self {
        match value {
            ReviewError::Validation(err) => Self::Validation(err),
            other @ ReviewError::InvalidState { .. } => Self::InvalidState {
                detail: other.to_string(),
            },
        }
    }
}
