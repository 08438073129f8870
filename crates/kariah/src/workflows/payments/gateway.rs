use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::domain::{GatewayCredentials, ProviderType};
use crate::config::PaymentsConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{provider} rejected the credentials: {message}")]
    Rejected {
        provider: ProviderType,
        message: String,
    },
    #[error("{provider} could not be reached: {message}")]
    Unreachable {
        provider: ProviderType,
        message: String,
    },
    #[error("{provider} returned an unexpected response: {message}")]
    UnexpectedResponse {
        provider: ProviderType,
        message: String,
    },
    #[error("failed to build payment gateway client: {0}")]
    Client(String),
}

/// Outcome of a successful connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub provider: ProviderType,
    pub is_sandbox: bool,
    /// Collection title (Billplz) or category name (ToyyibPay) echoed back by the gateway.
    pub detail: String,
}

/// Live credential check against a payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn test_connection(
        &self,
        credentials: &GatewayCredentials,
        is_sandbox: bool,
    ) -> Result<ConnectionReport, GatewayError>;
}

/// Gateway client speaking the Billplz v3 and ToyyibPay HTTP APIs.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    config: PaymentsConfig,
}

impl HttpPaymentGateway {
    pub fn new(config: PaymentsConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| GatewayError::Client(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn base_url(&self, provider: ProviderType, is_sandbox: bool) -> &str {
        let url = match (provider, is_sandbox) {
            (ProviderType::Billplz, false) => &self.config.billplz_url,
            (ProviderType::Billplz, true) => &self.config.billplz_sandbox_url,
            (ProviderType::Toyyibpay, false) => &self.config.toyyibpay_url,
            (ProviderType::Toyyibpay, true) => &self.config.toyyibpay_sandbox_url,
        };
        url.trim_end_matches('/')
    }

    async fn check_billplz(
        &self,
        api_key: &str,
        collection_id: &str,
        is_sandbox: bool,
    ) -> Result<ConnectionReport, GatewayError> {
        let provider = ProviderType::Billplz;
        let url = format!(
            "{}/api/v3/collections/{}",
            self.base_url(provider, is_sandbox),
            collection_id
        );
        debug!(%url, "testing billplz collection");

        let response = self
            .client
            .get(url)
            .basic_auth(api_key, None::<&str>)
            .send()
            .await
            .map_err(|err| unreachable(provider, &err))?;
        let (status, body) = read_body(provider, response).await?;

        if !status.is_success() {
            let message = billplz_error_message(&body).unwrap_or_else(|| status_message(status));
            return Err(GatewayError::Rejected { provider, message });
        }

        match body.get("id").and_then(Value::as_str) {
            Some(id) if id == collection_id => Ok(ConnectionReport {
                provider,
                is_sandbox,
                detail: body
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or(collection_id)
                    .to_string(),
            }),
            Some(other) => Err(GatewayError::UnexpectedResponse {
                provider,
                message: format!("collection id mismatch: expected {collection_id}, got {other}"),
            }),
            None => Err(GatewayError::UnexpectedResponse {
                provider,
                message: "collection id missing from response".to_string(),
            }),
        }
    }

    async fn check_toyyibpay(
        &self,
        secret_key: &str,
        category_code: &str,
        is_sandbox: bool,
    ) -> Result<ConnectionReport, GatewayError> {
        let provider = ProviderType::Toyyibpay;
        let url = format!(
            "{}/index.php/api/getCategoryDetails",
            self.base_url(provider, is_sandbox)
        );
        debug!(%url, "testing toyyibpay category");

        let response = self
            .client
            .post(url)
            .form(&[("userSecretKey", secret_key), ("categoryCode", category_code)])
            .send()
            .await
            .map_err(|err| unreachable(provider, &err))?;
        let (status, body) = read_body(provider, response).await?;

        let category_name = body
            .as_array()
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.get("categoryName"))
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty());

        match category_name {
            Some(name) if status.is_success() => Ok(ConnectionReport {
                provider,
                is_sandbox,
                detail: name.to_string(),
            }),
            _ => match toyyibpay_error_message(&body) {
                Some(message) => Err(GatewayError::Rejected { provider, message }),
                None if !status.is_success() => Err(GatewayError::Rejected {
                    provider,
                    message: status_message(status),
                }),
                None => Err(GatewayError::UnexpectedResponse {
                    provider,
                    message: "category details missing from response".to_string(),
                }),
            },
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn test_connection(
        &self,
        credentials: &GatewayCredentials,
        is_sandbox: bool,
    ) -> Result<ConnectionReport, GatewayError> {
        match credentials {
            GatewayCredentials::Billplz {
                api_key,
                collection_id,
                ..
            } => self.check_billplz(api_key, collection_id, is_sandbox).await,
            GatewayCredentials::Toyyibpay {
                secret_key,
                category_code,
            } => {
                self.check_toyyibpay(secret_key, category_code, is_sandbox)
                    .await
            }
        }
    }
}

fn unreachable(provider: ProviderType, err: &reqwest::Error) -> GatewayError {
    GatewayError::Unreachable {
        provider,
        message: err.to_string(),
    }
}

// Non-JSON bodies (HTML error pages, empty 401s) decode as `Null`.
async fn read_body(
    provider: ProviderType,
    response: reqwest::Response,
) -> Result<(StatusCode, Value), GatewayError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| unreachable(provider, &err))?;
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);
    Ok((status, body))
}

fn status_message(status: StatusCode) -> String {
    format!("gateway responded with HTTP {}", status.as_u16())
}

fn billplz_error_message(body: &Value) -> Option<String> {
    match body.get("error")?.get("message")? {
        Value::String(message) => Some(message.clone()),
        Value::Array(messages) => {
            let joined: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
            (!joined.is_empty()).then(|| joined.join("; "))
        }
        _ => None,
    }
}

fn toyyibpay_error_message(body: &Value) -> Option<String> {
    let entry = match body {
        Value::Array(entries) => entries.first()?,
        other => other,
    };
    entry
        .get("msg")
        .and_then(Value::as_str)
        .map(str::to_string)
}
