//! # Provider Modules
//!
//! The capability boundary between the provisioning pipeline and the cloud.
//!
//! The pipeline only ever talks to [`CloudGateway`] trait objects obtained
//! from a [`GatewayFactory`]; it never sees concrete provider types. The GCP
//! REST implementation lives in [`gcp`], an in-memory one in
//! [`crate::testing`].

use async_trait::async_trait;
use std::sync::Arc;
use zeroize::Zeroizing;

pub mod error;
pub mod gcp;
pub mod model;

pub use error::GatewayError;
pub use model::{Binding, IamPolicy, Operation, ServiceAccount, ServiceAccountKey};

/// Organization-level credentials loaded for one reconciliation
///
/// The auth blob is wiped from memory when the value is dropped.
pub struct CloudCredentials {
    /// Service account JSON of the organization account
    pub auth_json: Zeroizing<Vec<u8>>,
    /// Billing account linked to every new project
    pub billing_account_id: String,
}

impl std::fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("auth_json", &"***")
            .field("billing_account_id", &self.billing_account_id)
            .finish()
    }
}

/// Provider operations, bound to a single project
///
/// Every method is one remote call. Implementations report a provider
/// "already exists" as [`GatewayError::Conflict`] and a missing resource as
/// [`GatewayError::NotFound`]; deciding whether those are acceptable is left
/// to the caller.
#[async_trait]
pub trait CloudGateway: Send + Sync {
    /// Project this gateway is bound to
    fn project_id(&self) -> &str;

    /// Create the project under `parent_folder_id`
    async fn create_project(&self, parent_folder_id: &str) -> Result<Operation, GatewayError>;

    /// Delete the project
    async fn delete_project(&self) -> Result<(), GatewayError>;

    /// Look up a service account by account id
    async fn get_service_account(&self, name: &str) -> Result<ServiceAccount, GatewayError>;

    /// Create a service account
    async fn create_service_account(
        &self,
        name: &str,
        display_name: &str,
    ) -> Result<ServiceAccount, GatewayError>;

    /// Delete a service account
    async fn delete_service_account(&self, email: &str) -> Result<(), GatewayError>;

    /// List every key of a service account, system-managed ones included
    async fn list_service_account_keys(
        &self,
        email: &str,
    ) -> Result<Vec<ServiceAccountKey>, GatewayError>;

    /// Delete one key by resource name
    async fn delete_service_account_key(&self, key_name: &str) -> Result<(), GatewayError>;

    /// Mint a new key; the response carries the private key material
    async fn create_service_account_key(
        &self,
        email: &str,
    ) -> Result<ServiceAccountKey, GatewayError>;

    /// Read the project IAM policy
    async fn get_iam_policy(&self) -> Result<IamPolicy, GatewayError>;

    /// Replace the project IAM policy
    async fn set_iam_policy(&self, policy: &IamPolicy) -> Result<IamPolicy, GatewayError>;

    /// Enable the Cloud Billing API for `project_id`
    async fn enable_billing_api(&self, project_id: &str) -> Result<(), GatewayError>;

    /// Enable the Cloud DNS API for `project_id`
    async fn enable_dns_api(&self, project_id: &str) -> Result<(), GatewayError>;

    /// Link `project_id` to `billing_account_id`
    async fn create_cloud_billing_account(
        &self,
        project_id: &str,
        billing_account_id: &str,
    ) -> Result<(), GatewayError>;
}

/// Builds project-bound gateways from resolved credentials
#[async_trait]
pub trait GatewayFactory: Send + Sync {
    async fn build(
        &self,
        project_id: &str,
        credentials: &CloudCredentials,
    ) -> Result<Arc<dyn CloudGateway>, GatewayError>;
}
