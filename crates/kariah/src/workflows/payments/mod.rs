//! Payment provider settings: credential checks, live connectivity tests, and
//! the single-active-provider rule.

pub mod domain;
pub mod gateway;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    GatewayCredentials, ProviderConfigRecord, ProviderConfigView, ProviderCredentials,
    ProviderType,
};
pub use gateway::{ConnectionReport, GatewayError, HttpPaymentGateway, PaymentGateway};
pub use repository::{Activation, ProviderConfigRepository};
pub use router::payment_provider_router;
pub use service::{PaymentProviderError, PaymentProviderService};
pub use validation::{validate_credentials, CredentialError};
