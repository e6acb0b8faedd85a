//! # Credential Resolver
//!
//! Loads the organization service account and billing account from the
//! operator namespace. Re-read on every pass so out-of-band rotation is
//! picked up without a restart.

use super::error::ProvisionError;
use crate::constants::{BILLING_ACCOUNT_KEY, SERVICE_ACCOUNT_JSON_KEY};
use crate::provider::CloudCredentials;
use crate::store::SecretStore;
use tracing::debug;
use zeroize::Zeroizing;

/// Read the organization credentials from `namespace/name`
///
/// # Errors
/// `CredentialUnavailable` if the secret or one of its fields is missing or
/// the billing account is not UTF-8, `SecretStore` if the store itself fails
pub async fn resolve(
    store: &dyn SecretStore,
    namespace: &str,
    name: &str,
) -> Result<CloudCredentials, ProvisionError> {
    let unavailable = |reason: String| ProvisionError::CredentialUnavailable {
        namespace: namespace.to_string(),
        name: name.to_string(),
        reason,
    };

    let mut data = store
        .get_secret(namespace, name)
        .await
        .map_err(|e| ProvisionError::secret_store("read", namespace, name, e))?
        .ok_or_else(|| unavailable("secret not found".to_string()))?;

    let auth_json = data
        .remove(SERVICE_ACCOUNT_JSON_KEY)
        .filter(|value| !value.is_empty())
        .map(Zeroizing::new)
        .ok_or_else(|| unavailable(format!("missing key {SERVICE_ACCOUNT_JSON_KEY}")))?;

    let billing_account_id = data
        .remove(BILLING_ACCOUNT_KEY)
        .map(String::from_utf8)
        .transpose()
        .map_err(|e| unavailable(format!("{BILLING_ACCOUNT_KEY} is not valid UTF-8: {e}")))?
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| unavailable(format!("missing key {BILLING_ACCOUNT_KEY}")))?;

    debug!(
        "Loaded organization credentials from {}/{} (billing account {})",
        namespace, name, billing_account_id
    );

    Ok(CloudCredentials {
        auth_json,
        billing_account_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SecretData;
    use crate::testing::InMemorySecretStore;

    fn org_secret(auth: &[u8], billing: &[u8]) -> SecretData {
        SecretData::from([
            (SERVICE_ACCOUNT_JSON_KEY.to_string(), auth.to_vec()),
            (BILLING_ACCOUNT_KEY.to_string(), billing.to_vec()),
        ])
    }

    #[tokio::test]
    async fn test_resolves_both_fields() {
        let store = InMemorySecretStore::new();
        store.insert("gcp-project-operator", "gcp-project-operator", org_secret(b"{\"type\":\"service_account\"}", b"0000-1111\n"));

        let creds = resolve(&store, "gcp-project-operator", "gcp-project-operator")
            .await
            .unwrap();
        assert_eq!(creds.billing_account_id, "0000-1111");
        assert_eq!(creds.auth_json.as_slice(), b"{\"type\":\"service_account\"}");
    }

    #[tokio::test]
    async fn test_missing_secret_is_unavailable() {
        let store = InMemorySecretStore::new();
        let err = resolve(&store, "gcp-project-operator", "gcp-project-operator")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::CredentialUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_billing_account_is_unavailable() {
        let store = InMemorySecretStore::new();
        store.insert("ops", "org", org_secret(b"{}", b"  "));

        let err = resolve(&store, "ops", "org").await.unwrap_err();
        match err {
            ProvisionError::CredentialUnavailable { reason, .. } => {
                assert!(reason.contains(BILLING_ACCOUNT_KEY));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_utf8_billing_account_is_unavailable() {
        let store = InMemorySecretStore::new();
        store.insert("ops", "org", org_secret(b"{}", &[0xff, b'1', b'2']));

        let err = resolve(&store, "ops", "org").await.unwrap_err();
        match err {
            ProvisionError::CredentialUnavailable { reason, .. } => {
                assert!(reason.contains("not valid UTF-8"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
