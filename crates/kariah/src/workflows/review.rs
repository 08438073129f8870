//! Status transition rules shared by kariah applications and khairat claims.
//!
//! Both entities are reviewed the same way: a tenant admin approves or rejects a
//! record that is still awaiting review, a rejection always carries admin notes, and
//! every other move is checked against the entity's own transition table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::{TenantId, UserId};

/// Outcome a reviewer can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewDecision::Approved => "approved",
            ReviewDecision::Rejected => "rejected",
        }
    }
}

/// Status enums that participate in the review workflow.
pub trait ReviewableStatus: Copy + Eq + fmt::Debug {
    const APPROVED: Self;
    const REJECTED: Self;

    fn label(self) -> &'static str;

    /// Whether the transition table allows moving from `self` to `next`.
    fn can_transition_to(self, next: Self) -> bool;

    fn is_awaiting_review(self) -> bool;

    fn for_decision(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => Self::APPROVED,
            ReviewDecision::Rejected => Self::REJECTED,
        }
    }
}

/// Input rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("admin notes are required when rejecting")]
    MissingAdminNotes,
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Failure to apply a status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot move from {from} to {to}")]
    InvalidState {
        from: &'static str,
        to: &'static str,
    },
}

/// Reviewer request shared by the application and claim services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCommand<Id> {
    pub id: Id,
    pub tenant_id: TenantId,
    pub decision: ReviewDecision,
    pub reviewer_id: UserId,
    pub admin_notes: Option<String>,
    /// When set, the review only applies if the stored row still has this version.
    pub expected_version: Option<u64>,
}

/// Result of a successful review: the next status and the notes to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome<S> {
    pub status: S,
    pub admin_notes: Option<String>,
}

/// Validate a reviewer decision against the current status.
pub fn review_transition<S: ReviewableStatus>(
    current: S,
    decision: ReviewDecision,
    admin_notes: Option<&str>,
) -> Result<ReviewOutcome<S>, ReviewError> {
    let admin_notes = normalize_notes(admin_notes);
    if decision == ReviewDecision::Rejected && admin_notes.is_none() {
        return Err(ValidationError::MissingAdminNotes.into());
    }

    let next = S::for_decision(decision);
    if !current.is_awaiting_review() || !current.can_transition_to(next) {
        return Err(ReviewError::InvalidState {
            from: current.label(),
            to: next.label(),
        });
    }

    Ok(ReviewOutcome {
        status: next,
        admin_notes,
    })
}

/// Check a non-review move (withdraw, cancel, pay, start review).
pub fn ensure_transition<S: ReviewableStatus>(current: S, next: S) -> Result<S, ReviewError> {
    if current.can_transition_to(next) {
        Ok(next)
    } else {
        Err(ReviewError::InvalidState {
            from: current.label(),
            to: next.label(),
        })
    }
}

pub(crate) fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(str::to_string)
}
