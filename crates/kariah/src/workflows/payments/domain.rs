use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::TenantId;

/// Payment gateways a tenant can collect contributions through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Billplz,
    Toyyibpay,
}

impl ProviderType {
    pub fn label(self) -> &'static str {
        match self {
            ProviderType::Billplz => "billplz",
            ProviderType::Toyyibpay => "toyyibpay",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "billplz" => Ok(ProviderType::Billplz),
            "toyyibpay" => Ok(ProviderType::Toyyibpay),
            other => Err(format!("unknown payment provider '{other}'")),
        }
    }
}

/// Credential form as posted by the admin settings page. Which fields matter
/// depends on the provider; see [`super::validation::validate_credentials`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub x_signature_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub category_code: Option<String>,
}

/// Credentials that passed the completeness check for their provider.
#[derive(Clone, PartialEq, Eq)]
pub enum GatewayCredentials {
    Billplz {
        api_key: String,
        collection_id: String,
        x_signature_key: Option<String>,
    },
    Toyyibpay {
        secret_key: String,
        category_code: String,
    },
}

impl GatewayCredentials {
    pub fn provider(&self) -> ProviderType {
        match self {
            GatewayCredentials::Billplz { .. } => ProviderType::Billplz,
            GatewayCredentials::Toyyibpay { .. } => ProviderType::Toyyibpay,
        }
    }

    /// Field map safe to return to clients: identifiers in clear, secrets masked.
    pub fn masked(&self) -> BTreeMap<&'static str, String> {
        let mut fields = BTreeMap::new();
        match self {
            GatewayCredentials::Billplz {
                api_key,
                collection_id,
                x_signature_key,
            } => {
                fields.insert("apiKey", mask_secret(api_key));
                fields.insert("collectionId", collection_id.clone());
                if let Some(key) = x_signature_key {
                    fields.insert("xSignatureKey", mask_secret(key));
                }
            }
            GatewayCredentials::Toyyibpay {
                secret_key,
                category_code,
            } => {
                fields.insert("secretKey", mask_secret(secret_key));
                fields.insert("categoryCode", category_code.clone());
            }
        }
        fields
    }
}

// Secrets must not leak through `{:?}` in log lines.
impl fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("provider", &self.provider())
            .field("fields", &self.masked())
            .finish()
    }
}

pub(crate) fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfigRecord {
    pub tenant_id: TenantId,
    pub provider: ProviderType,
    pub credentials: GatewayCredentials,
    pub is_active: bool,
    pub is_sandbox: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderConfigView {
    pub tenant_id: TenantId,
    pub provider: ProviderType,
    pub is_active: bool,
    pub is_sandbox: bool,
    pub credentials: BTreeMap<&'static str, String>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderConfigRecord {
    pub fn view(&self) -> ProviderConfigView {
        ProviderConfigView {
            tenant_id: self.tenant_id.clone(),
            provider: self.provider,
            is_active: self.is_active,
            is_sandbox: self.is_sandbox,
            credentials: self.credentials.masked(),
            updated_at: self.updated_at,
        }
    }
}
