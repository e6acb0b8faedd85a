//! # Operator Policy
//!
//! The fixed contract tables consumed by the provisioning pipeline: which
//! regions are accepted, which roles the service account receives, and the
//! names of the secrets and identities involved.
//!
//! Built once at startup and shared read-only (`Arc<OperatorPolicy>`) with the
//! validator and the policy stage.

use crate::config::ControllerConfig;
use crate::constants;
use std::collections::BTreeSet;

/// Read-only provisioning policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorPolicy {
    /// Platform label value this operator is responsible for
    pub provider_tag: String,
    /// Roles granted to the service account, applied in this order
    pub required_roles: Vec<String>,
    /// Regions a request may target
    pub supported_regions: BTreeSet<String>,
    /// Folder new projects are created under
    pub parent_folder_id: String,
    /// Namespace of the organization credentials secret
    pub operator_namespace: String,
    /// Name of the organization credentials secret
    pub org_secret_name: String,
    /// Name of the generated secret in the request namespace
    pub output_secret_name: String,
    /// Name of the service account created in each project
    pub service_account_name: String,
}

impl Default for OperatorPolicy {
    fn default() -> Self {
        Self {
            provider_tag: constants::PROVIDER_TAG.to_string(),
            required_roles: constants::REQUIRED_ROLES
                .iter()
                .map(ToString::to_string)
                .collect(),
            supported_regions: constants::SUPPORTED_REGIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            parent_folder_id: constants::DEFAULT_PARENT_FOLDER_ID.to_string(),
            operator_namespace: constants::DEFAULT_OPERATOR_NAMESPACE.to_string(),
            org_secret_name: constants::ORG_SECRET_NAME.to_string(),
            output_secret_name: constants::OUTPUT_SECRET_NAME.to_string(),
            service_account_name: constants::SERVICE_ACCOUNT_NAME.to_string(),
        }
    }
}

impl OperatorPolicy {
    /// Default policy with the deployment-specific overrides from `config`
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            parent_folder_id: config.parent_folder_id.clone(),
            operator_namespace: config.operator_namespace.clone(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_supported_region(&self, region: &str) -> bool {
        self.supported_regions.contains(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_tables() {
        let policy = OperatorPolicy::default();
        assert_eq!(policy.required_roles.len(), 7);
        assert_eq!(policy.supported_regions.len(), 20);
        assert_eq!(policy.required_roles[0], "roles/storage.admin");
        assert!(policy.is_supported_region("us-east1"));
        assert!(!policy.is_supported_region("mars-north1"));
    }

    #[test]
    fn test_from_config_overrides_folder_and_namespace() {
        let config = ControllerConfig {
            parent_folder_id: "1234".to_string(),
            operator_namespace: "ops".to_string(),
            ..ControllerConfig::default()
        };
        let policy = OperatorPolicy::from_config(&config);
        assert_eq!(policy.parent_folder_id, "1234");
        assert_eq!(policy.operator_namespace, "ops");
        assert_eq!(policy.output_secret_name, "gcp");
    }
}
