//! # Secret Store
//!
//! Namespaced key/value secret storage used for the organization credentials
//! (read) and the per-cluster output credential (write-once).
//!
//! [`KubeSecretStore`] backs it with Kubernetes `Secret` objects; an in-memory
//! implementation lives in [`crate::testing`].

use crate::constants::OPERATOR_NAME;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{ObjectMeta, PostParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Secret payload: key → raw bytes
pub type SecretData = BTreeMap<String, Vec<u8>>;

const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// A secret with that name was created concurrently
    #[error("secret {namespace}/{name} already exists")]
    AlreadyExists { namespace: String, name: String },

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret's data; `None` when the secret does not exist
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, SecretStoreError>;

    /// Create a new secret; never overwrites an existing one
    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), SecretStoreError>;

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool, SecretStoreError> {
        Ok(self.get_secret(namespace, name).await?.is_some())
    }
}

/// Kubernetes-backed [`SecretStore`]
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, SecretStoreError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match secrets.get(name).await {
            Ok(secret) => {
                let data = secret
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(key, value)| (key, value.0))
                    .collect();
                Ok(Some(data))
            }
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!("Secret {}/{} not found", namespace, name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), SecretStoreError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = build_secret(namespace, name, data);

        match secrets.create(&PostParams::default(), &secret).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(api_err)) if api_err.code == 409 => {
                Err(SecretStoreError::AlreadyExists {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Opaque secret labelled as managed by the operator
fn build_secret(namespace: &str, name: &str, data: SecretData) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([(
                MANAGED_BY_LABEL.to_string(),
                OPERATOR_NAME.to_string(),
            )])),
            ..ObjectMeta::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(
            data.into_iter()
                .map(|(key, value)| (key, ByteString(value)))
                .collect(),
        ),
        ..Secret::default()
    }
}
