//! # Secret Publisher
//!
//! Writes the freshly minted key into the request namespace. The existence
//! of that secret is what marks a request as fully provisioned.

use super::error::ProvisionError;
use crate::constants::SERVICE_ACCOUNT_JSON_KEY;
use crate::observability::metrics;
use crate::provider::ServiceAccountKey;
use crate::store::{SecretData, SecretStore};
use base64::{engine::general_purpose, Engine as _};
use tracing::info;

/// Whether the output secret is already present
///
/// # Errors
/// Any store error other than absence
pub async fn output_secret_exists(
    store: &dyn SecretStore,
    namespace: &str,
    name: &str,
) -> Result<bool, ProvisionError> {
    store
        .secret_exists(namespace, name)
        .await
        .map_err(|e| ProvisionError::secret_store("read", namespace, name, e))
}

/// Decode `key` and store it as `namespace/name`
///
/// # Errors
/// `KeyDecode` for empty or non-base64 key material, `SecretStore` if the
/// secret cannot be created (including when it already exists)
pub async fn publish(
    store: &dyn SecretStore,
    namespace: &str,
    name: &str,
    key: &ServiceAccountKey,
) -> Result<(), ProvisionError> {
    if key.private_key_data.is_empty() {
        return Err(ProvisionError::KeyDecode(format!(
            "key {} carried no private key data",
            key.name
        )));
    }

    let decoded = general_purpose::STANDARD
        .decode(key.private_key_data.as_bytes())
        .map_err(|e| ProvisionError::KeyDecode(e.to_string()))?;

    let data = SecretData::from([(SERVICE_ACCOUNT_JSON_KEY.to_string(), decoded)]);
    store
        .create_secret(namespace, name, data)
        .await
        .map_err(|e| ProvisionError::secret_store("create", namespace, name, e))?;
    metrics::increment_secrets_published();

    info!("Published service account credentials to {}/{}", namespace, name);
    Ok(())
}
