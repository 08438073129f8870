//! Khairat (benevolent fund) claims: the review workflow plus payout and cancellation.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{ClaimId, ClaimRecord, ClaimStatus, ClaimStatusView, ClaimSubmission};
pub use repository::ClaimRepository;
pub use router::claim_router;
pub use service::{ClaimService, ClaimServiceError};
