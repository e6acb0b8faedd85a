//! GCP API endpoints and resource paths
//!
//! Base URLs are configurable so contract tests can point the gateway at a
//! mock server. Paths are relative to each API's base URL.

/// Base URLs of the GCP APIs used by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpEndpoints {
    /// Cloud Resource Manager v1
    pub resource_manager: String,
    /// IAM v1
    pub iam: String,
    /// Service Management v1
    pub service_management: String,
    /// Cloud Billing v1
    pub cloud_billing: String,
    /// OAuth2 token endpoint; when unset the `token_uri` of the credentials file is used
    pub token_uri: Option<String>,
}

impl Default for GcpEndpoints {
    fn default() -> Self {
        Self {
            resource_manager: "https://cloudresourcemanager.googleapis.com".to_string(),
            iam: "https://iam.googleapis.com".to_string(),
            service_management: "https://servicemanagement.googleapis.com".to_string(),
            cloud_billing: "https://cloudbilling.googleapis.com".to_string(),
            token_uri: None,
        }
    }
}

impl GcpEndpoints {
    /// Point every API at the same base URL
    #[must_use]
    pub fn single(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            resource_manager: base.clone(),
            iam: base.clone(),
            service_management: base.clone(),
            cloud_billing: base.clone(),
            token_uri: Some(format!("{base}/token")),
        }
    }
}

/// Join a base URL and a `v1` path
pub(crate) fn url(base: &str, path: &str) -> String {
    format!("{}/v1/{}", base.trim_end_matches('/'), path)
}

pub(crate) fn projects() -> String {
    "projects".to_string()
}

pub(crate) fn project(project_id: &str) -> String {
    format!("projects/{project_id}")
}

pub(crate) fn project_get_iam_policy(project_id: &str) -> String {
    format!("projects/{project_id}:getIamPolicy")
}

pub(crate) fn project_set_iam_policy(project_id: &str) -> String {
    format!("projects/{project_id}:setIamPolicy")
}

pub(crate) fn service_accounts(project_id: &str) -> String {
    format!("projects/{project_id}/serviceAccounts")
}

/// `email_or_id` may be the account email or its unique id
pub(crate) fn service_account(project_id: &str, email_or_id: &str) -> String {
    format!("projects/{project_id}/serviceAccounts/{email_or_id}")
}

pub(crate) fn service_account_keys(project_id: &str, email: &str) -> String {
    format!("projects/{project_id}/serviceAccounts/{email}/keys")
}

pub(crate) fn enable_service(service: &str) -> String {
    format!("services/{service}:enable")
}

pub(crate) fn billing_info(project_id: &str) -> String {
    format!("projects/{project_id}/billingInfo")
}
