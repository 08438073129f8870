use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{ClaimId, ClaimRecord, ClaimStatus, ClaimSubmission};
use super::repository::ClaimRepository;
use crate::session::{TenantId, UserId};
use crate::workflows::kariah::intake::required_text;
use crate::workflows::kariah::{Notification, NotificationPublisher, RepositoryError};
use crate::workflows::review::{
    ensure_transition, normalize_notes, review_transition, ReviewCommand, ReviewError,
    ReviewableStatus, ValidationError,
};

/// Claim intake, review, payout, and cancellation.
pub struct ClaimService<C, N> {
    claims: Arc<C>,
    notifications: Arc<N>,
}

static CLAIM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_claim_id() -> ClaimId {
    let id = CLAIM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ClaimId(format!("claim-{id:06}"))
}

impl<C, N> ClaimService<C, N>
where
    C: ClaimRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(claims: Arc<C>, notifications: Arc<N>) -> Self {
        Self {
            claims,
            notifications,
        }
    }

    pub fn submit(
        &self,
        tenant_id: TenantId,
        claimant_id: UserId,
        submission: ClaimSubmission,
    ) -> Result<ClaimRecord, ClaimServiceError> {
        let deceased_name = required_text("deceased_name", &submission.deceased_name)?;
        let relationship = required_text("relationship", &submission.relationship)?;
        if submission.amount_sen == 0 {
            return Err(ValidationError::InvalidField {
                field: "amount_sen",
                reason: "claim amount must be greater than zero".to_string(),
            }
            .into());
        }

        let record = ClaimRecord {
            id: next_claim_id(),
            claimant_id,
            tenant_id,
            deceased_name,
            relationship,
            amount_sen: submission.amount_sen,
            description: normalize_notes(submission.description.as_deref()),
            status: ClaimStatus::Pending,
            submitted_at: Utc::now(),
            reviewed_by: None,
            reviewed_at: None,
            admin_notes: None,
            paid_by: None,
            paid_at: None,
            version: 1,
        };

        let stored = self.claims.insert(record)?;
        info!(claim_id = %stored.id.0, tenant_id = %stored.tenant_id, "khairat claim submitted");
        Ok(stored)
    }

    pub fn start_review(
        &self,
        claim_id: &ClaimId,
        tenant_id: &TenantId,
        reviewer_id: &UserId,
    ) -> Result<ClaimRecord, ClaimServiceError> {
        let mut record = self.load_for_tenant(claim_id, tenant_id)?;
        record.status = ensure_transition(record.status, ClaimStatus::UnderReview)?;
        let stored = self.claims.update(record)?;
        info!(claim_id = %stored.id.0, reviewer = %reviewer_id, "khairat claim under review");
        Ok(stored)
    }

    /// Approve or reject a claim awaiting review; same rules as kariah applications.
    pub fn review(&self, command: ReviewCommand<ClaimId>) -> Result<ClaimRecord, ClaimServiceError> {
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

        let stored = self.claims.update(record)?;
        info!(
            claim_id = %stored.id.0,
            reviewer = %reviewer_id,
            decision = decision.label(),
            "khairat claim reviewed"
        );
        self.notify_claimant(&stored, &format!("khairat_claim_{}", decision.label()));
        Ok(stored)
    }

    /// Record the payout of an approved claim.
    pub fn mark_paid(
        &self,
        claim_id: &ClaimId,
        tenant_id: &TenantId,
        treasurer_id: &UserId,
    ) -> Result<ClaimRecord, ClaimServiceError> {
        let mut record = self.load_for_tenant(claim_id, tenant_id)?;
        record.status = ensure_transition(record.status, ClaimStatus::Paid)?;
        record.paid_by = Some(treasurer_id.clone());
        record.paid_at = Some(Utc::now());

        let stored = self.claims.update(record)?;
        info!(
            claim_id = %stored.id.0,
            treasurer = %treasurer_id,
            amount_sen = stored.amount_sen,
            "khairat claim paid"
        );
        self.notify_claimant(&stored, "khairat_claim_paid");
        Ok(stored)
    }

    /// Claimant-initiated cancellation of a claim nobody has picked up yet.
    pub fn cancel(
        &self,
        claim_id: &ClaimId,
        claimant_id: &UserId,
    ) -> Result<ClaimRecord, ClaimServiceError> {
        let mut record = self
            .claims
            .fetch(claim_id)?
            .ok_or(RepositoryError::NotFound)?;
        if &record.claimant_id != claimant_id {
            return Err(ClaimServiceError::NotAuthorized {
                action: "cancel this claim",
            });
        }

        record.status = ensure_transition(record.status, ClaimStatus::Cancelled)?;
        let stored = self.claims.update(record)?;
        info!(claim_id = %stored.id.0, "khairat claim cancelled");
        Ok(stored)
    }

    pub fn get(&self, claim_id: &ClaimId) -> Result<ClaimRecord, ClaimServiceError> {
        let record = self
            .claims
            .fetch(claim_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn pending_for_tenant(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<ClaimRecord>, ClaimServiceError> {
        Ok(self.claims.pending(tenant_id, limit)?)
    }

    fn load_for_tenant(
        &self,
        claim_id: &ClaimId,
        tenant_id: &TenantId,
    ) -> Result<ClaimRecord, ClaimServiceError> {
        let record = self
            .claims
            .fetch(claim_id)?
            .ok_or(RepositoryError::NotFound)?;
        if &record.tenant_id != tenant_id {
            return Err(ClaimServiceError::NotAuthorized {
                action: "act on claims of another tenant",
            });
        }
        Ok(record)
    }

    fn notify_claimant(&self, record: &ClaimRecord, template: &str) {
        let mut details = BTreeMap::new();
        details.insert("status".to_string(), record.status.label().to_string());
        details.insert("amount_sen".to_string(), record.amount_sen.to_string());
        if let Some(notes) = &record.admin_notes {
            details.insert("admin_notes".to_string(), notes.clone());
        }

        let notification = Notification {
            recipient: record.claimant_id.clone(),
            tenant_id: record.tenant_id.clone(),
            template: template.to_string(),
            subject_id: record.id.0.clone(),
            details,
        };

        if let Err(err) = self.notifications.publish(notification) {
            warn!(claim_id = %record.id.0, error = %err, "claimant notification failed");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not authorized to {action}")]
    NotAuthorized { action: &'static str },
    #[error("invalid state: {detail}")]
    InvalidState { detail: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ReviewError> for ClaimServiceError {
    fn from(value: ReviewError) -> Self {
        match value {
            ReviewError::Validation(err) => Self::Validation(err),
            other @ ReviewError::InvalidState { .. } => Self::InvalidState {
                detail: other.to_string(),
            },
        }
    }
}
