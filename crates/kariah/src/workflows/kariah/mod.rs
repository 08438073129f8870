//! Kariah (congregational membership) applications and the memberships they open.

pub mod domain;
pub mod intake;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantDetails, ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationStatusView,
    ApplicationSubmission, MembershipId, MembershipRecord, MembershipStatus, MembershipView,
};
pub use intake::IntakeGuard;
pub use repository::{
    ApplicationRepository, MembershipRepository, Notification, NotificationError,
    NotificationPublisher, RepositoryError,
};
pub use router::membership_router;
pub use service::{MembershipService, MembershipServiceError};
