//! Membership review, khairat claim review, and payment-provider activation for
//! multi-tenant mosque administration.

pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod workflows;
