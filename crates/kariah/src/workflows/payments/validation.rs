use tracing::warn;

use super::domain::{GatewayCredentials, ProviderCredentials, ProviderType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing {provider} credentials: {}", .missing.join(", "))]
pub struct CredentialError {
    pub provider: ProviderType,
    /// Form field names, as the client spells them.
    pub missing: Vec<&'static str>,
}

/// Check that every field `provider` requires is present and non-blank.
///
/// Billplz needs `apiKey` and `collectionId`; `xSignatureKey` is only needed
/// for callback verification, so its absence is logged and tolerated.
/// ToyyibPay needs `secretKey` and `categoryCode`.
pub fn validate_credentials(
    provider: ProviderType,
    credentials: &ProviderCredentials,
) -> Result<GatewayCredentials, CredentialError> {
    let mut missing = Vec::new();

    let validated = match provider {
        ProviderType::Billplz => {
            let api_key = present("apiKey", &credentials.api_key, &mut missing);
            let collection_id = present("collectionId", &credentials.collection_id, &mut missing);
            let x_signature_key = filled(&credentials.x_signature_key);
            match (api_key, collection_id) {
                (Some(api_key), Some(collection_id)) => {
                    if x_signature_key.is_none() {
                        warn!(provider = %provider, "xSignatureKey not set; payment callbacks cannot be verified");
                    }
                    Some(GatewayCredentials::Billplz {
                        api_key,
                        collection_id,
                        x_signature_key,
                    })
                }
                _ => None,
            }
        }
        ProviderType::Toyyibpay => {
            let secret_key = present("secretKey", &credentials.secret_key, &mut missing);
            let category_code = present("categoryCode", &credentials.category_code, &mut missing);
            match (secret_key, category_code) {
                (Some(secret_key), Some(category_code)) => Some(GatewayCredentials::Toyyibpay {
                    secret_key,
                    category_code,
                }),
                _ => None,
            }
        }
    };

    validated.ok_or(CredentialError { provider, missing })
}

fn filled(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn present(
    field: &'static str,
    value: &Option<String>,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    let found = filled(value);
    if found.is_none() {
        missing.push(field);
    }
    found
}
