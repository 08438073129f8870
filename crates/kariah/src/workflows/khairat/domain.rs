use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{TenantId, UserId};
use crate::workflows::review::ReviewableStatus;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimId(pub String);

/// Benevolent-fund claim form filed by a khairat member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSubmission {
    pub deceased_name: String,
    pub relationship: String,
    /// Requested amount in sen.
    pub amount_sen: u64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Paid,
    Cancelled,
}

impl ReviewableStatus for ClaimStatus {
    const APPROVED: Self = ClaimStatus::Approved;
    const REJECTED: Self = ClaimStatus::Rejected;

    fn label(self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::UnderReview => "under_review",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Paid => "paid",
            ClaimStatus::Cancelled => "cancelled",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (Approved, Paid)
        )
    }

    fn is_awaiting_review(self) -> bool {
        matches!(self, ClaimStatus::Pending | ClaimStatus::UnderReview)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: ClaimId,
    pub claimant_id: UserId,
    pub tenant_id: TenantId,
    pub deceased_name: String,
    pub relationship: String,
    pub amount_sen: u64,
    pub description: Option<String>,
    pub status: ClaimStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    pub paid_by: Option<UserId>,
    pub paid_at: Option<DateTime<Utc>>,
    pub version: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimStatusView {
    pub claim_id: ClaimId,
    pub tenant_id: TenantId,
    pub status: &'static str,
    pub amount_sen: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl ClaimRecord {
    pub fn status_view(&self) -> ClaimStatusView {
        ClaimStatusView {
            claim_id: self.id.clone(),
            tenant_id: self.tenant_id.clone(),
            status: self.status.label(),
            amount_sen: self.amount_sen,
            reviewed_by: self.reviewed_by.clone(),
            reviewed_at: self.reviewed_at,
            admin_notes: self.admin_notes.clone(),
            paid_by: self.paid_by.clone(),
            paid_at: self.paid_at,
            version: self.version,
        }
    }
}
