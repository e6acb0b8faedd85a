//! # Provider Model
//!
//! Provider-neutral views of the resources the pipeline touches. Field names
//! follow the GCP REST JSON representation so the REST gateway can
//! (de)serialize them directly.

use serde::{Deserialize, Serialize};

/// Long-running operation handle returned by project creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

/// Service account (the "service identity" of a project)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// Resource name, `projects/{project}/serviceAccounts/{email}`
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
}

impl ServiceAccount {
    /// IAM principal string used in policy bindings
    #[must_use]
    pub fn principal(&self) -> String {
        service_account_principal(&self.email)
    }
}

/// `serviceAccount:<email>`
#[must_use]
pub fn service_account_principal(email: &str) -> String {
    format!("serviceAccount:{email}")
}

/// Email GCP assigns to a service account created with `account_id`
#[must_use]
pub fn service_account_email(account_id: &str, project_id: &str) -> String {
    format!("{account_id}@{project_id}.iam.gserviceaccount.com")
}

/// Service account key
///
/// `private_key_data` is only populated on the create response; it is the
/// base64 encoding of the service account JSON file.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountKey {
    /// Resource name, `projects/{project}/serviceAccounts/{email}/keys/{id}`
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key_data: String,
    /// `USER_MANAGED` or `SYSTEM_MANAGED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("name", &self.name)
            .field("key_type", &self.key_type)
            .field(
                "private_key_data",
                &if self.private_key_data.is_empty() { "" } else { "***" },
            )
            .finish()
    }
}

/// IAM policy attached to a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    /// Concurrency token; sent back unchanged on write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// Role → members association
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
    /// Conditional binding expression, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<serde_json::Value>,
}

impl Binding {
    #[must_use]
    pub fn new(role: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            role: role.into(),
            members,
            condition: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_roundtrips_gcp_json() {
        let policy: IamPolicy = serde_json::from_value(serde_json::json!({
            "version": 1,
            "etag": "BwWWja0YfJA=",
            "bindings": [
                { "role": "roles/owner", "members": ["user:mike@example.com"] }
            ]
        }))
        .unwrap();
        assert_eq!(policy.etag.as_deref(), Some("BwWWja0YfJA="));
        assert_eq!(policy.bindings[0].role, "roles/owner");

        let json = serde_json::to_value(&policy).unwrap();
        assert!(json["bindings"][0].get("condition").is_none());
    }

    #[test]
    fn test_key_debug_redacts_material() {
        let key = ServiceAccountKey {
            name: "k1".to_string(),
            private_key_data: "c2VjcmV0".to_string(),
            key_type: None,
        };
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("c2VjcmV0"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_service_account_email_and_principal() {
        let email = service_account_email("osd-managed-admin", "proj-1");
        assert_eq!(email, "osd-managed-admin@proj-1.iam.gserviceaccount.com");
        assert_eq!(
            service_account_principal(&email),
            "serviceAccount:osd-managed-admin@proj-1.iam.gserviceaccount.com"
        );
    }
}
