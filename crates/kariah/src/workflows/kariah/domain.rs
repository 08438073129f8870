use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{TenantId, UserId};
use crate::workflows::review::ReviewableStatus;

/// Identifier wrapper for kariah membership applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for memberships created on approval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembershipId(pub String);

/// Form payload a user submits when applying to join a mosque's kariah.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub full_name: String,
    pub ic_number: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub dependents: u8,
}

/// Submission after intake validation; the IC number is stored in dashed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantDetails {
    pub full_name: String,
    pub ic_number: String,
    pub phone: String,
    pub address: String,
    pub occupation: Option<String>,
    pub dependents: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Withdrawn,
}

impl ReviewableStatus for ApplicationStatus {
    const APPROVED: Self = ApplicationStatus::Approved;
    const REJECTED: Self = ApplicationStatus::Rejected;

    fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (Approved, Withdrawn)
        )
    }

    fn is_awaiting_review(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::UnderReview
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Withdrawn,
}

impl MembershipStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Withdrawn => "withdrawn",
        }
    }
}

/// Stored application row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub applicant: ApplicantDetails,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    /// Membership opened by approving this application.
    pub membership_id: Option<MembershipId>,
    /// Incremented by every persisted update; used for compare-and-set.
    pub version: u64,
}

/// Stored membership row created when an application is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub id: MembershipId,
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl MembershipRecord {
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}

/// Sanitized representation returned by the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub tenant_id: TenantId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_id: Option<MembershipId>,
    pub version: u64,
}

impl ApplicationRecord {
    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            tenant_id: self.tenant_id.clone(),
            status: self.status.label(),
            reviewed_by: self.reviewed_by.clone(),
            reviewed_at: self.reviewed_at,
            admin_notes: self.admin_notes.clone(),
            membership_id: self.membership_id.clone(),
            version: self.version,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MembershipView {
    pub membership_id: MembershipId,
    pub application_id: ApplicationId,
    pub tenant_id: TenantId,
    pub status: &'static str,
    pub joined_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawn_at: Option<DateTime<Utc>>,
}

impl MembershipRecord {
    pub fn view(&self) -> MembershipView {
        MembershipView {
            membership_id: self.id.clone(),
            application_id: self.application_id.clone(),
            tenant_id: self.tenant_id.clone(),
            status: self.status.label(),
            joined_at: self.joined_at,
            withdrawn_at: self.withdrawn_at,
        }
    }
}
