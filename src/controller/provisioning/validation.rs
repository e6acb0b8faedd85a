//! # Validation
//!
//! Decides whether a `ClusterDeployment` is ours to provision and whether it
//! carries everything the pipeline needs.

use super::error::ValidationError;
use crate::config::OperatorPolicy;
use crate::constants::{CLUSTER_MANAGED_LABEL, CLUSTER_PLATFORM_LABEL};
use crate::crd::ClusterDeployment;
use kube::ResourceExt;

/// Desired state read from one `ClusterDeployment`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub namespace: String,
    pub name: String,
    pub project_id: String,
    pub region: String,
    /// Value of the cluster-platform label
    pub platform_kind: String,
    pub installed: bool,
    pub managed: bool,
}

impl DeploymentRequest {
    #[must_use]
    pub fn from_cluster_deployment(cd: &ClusterDeployment) -> Self {
        let labels = cd.labels();
        let gcp = cd.spec.platform.gcp.clone().unwrap_or_default();

        Self {
            namespace: cd.namespace().unwrap_or_default(),
            name: cd.name_any(),
            project_id: gcp.project_id,
            region: gcp.region,
            platform_kind: labels
                .get(CLUSTER_PLATFORM_LABEL)
                .cloned()
                .unwrap_or_default(),
            installed: cd.spec.installed,
            managed: labels
                .get(CLUSTER_MANAGED_LABEL)
                .is_some_and(|value| value == "true"),
        }
    }

    /// `namespace/name`
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    MissingProjectId,
    MissingRegion,
    RegionNotSupported,
    NotThisPlatform,
    NotManaged,
    /// Nothing left to do; not an error
    AlreadyInstalled,
}

impl ValidationOutcome {
    /// The error to surface, `None` for `Valid` and `AlreadyInstalled`
    #[must_use]
    pub fn error(self) -> Option<ValidationError> {
        match self {
            Self::Valid | Self::AlreadyInstalled => None,
            Self::MissingProjectId => Some(ValidationError::MissingProjectId),
            Self::MissingRegion => Some(ValidationError::MissingRegion),
            Self::RegionNotSupported => Some(ValidationError::RegionNotSupported),
            Self::NotThisPlatform => Some(ValidationError::NotThisPlatform),
            Self::NotManaged => Some(ValidationError::NotManaged),
        }
    }
}

/// Check `request` against `policy`; the first failing rule wins
#[must_use]
pub fn validate(request: &DeploymentRequest, policy: &OperatorPolicy) -> ValidationOutcome {
    if request.platform_kind != policy.provider_tag {
        return ValidationOutcome::NotThisPlatform;
    }
    if !request.managed {
        return ValidationOutcome::NotManaged;
    }
    if request.installed {
        return ValidationOutcome::AlreadyInstalled;
    }
    if request.project_id.is_empty() {
        return ValidationOutcome::MissingProjectId;
    }
    if request.region.is_empty() {
        return ValidationOutcome::MissingRegion;
    }
    if !policy.is_supported_region(&request.region) {
        return ValidationOutcome::RegionNotSupported;
    }
    ValidationOutcome::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DeploymentRequest {
        DeploymentRequest {
            namespace: "uhc-production-1".to_string(),
            name: "cluster-a".to_string(),
            project_id: "proj-1".to_string(),
            region: "us-east1".to_string(),
            platform_kind: "gcp".to_string(),
            installed: false,
            managed: true,
        }
    }

    #[test]
    fn test_valid_request() {
        assert_eq!(
            validate(&request(), &OperatorPolicy::default()),
            ValidationOutcome::Valid
        );
    }

    #[test]
    fn test_rule_order() {
        let policy = OperatorPolicy::default();

        // Platform is checked before anything else
        let foreign = DeploymentRequest {
            platform_kind: "aws".to_string(),
            managed: false,
            installed: true,
            project_id: String::new(),
            ..request()
        };
        assert_eq!(validate(&foreign, &policy), ValidationOutcome::NotThisPlatform);

        let unmanaged = DeploymentRequest {
            managed: false,
            installed: true,
            ..request()
        };
        assert_eq!(validate(&unmanaged, &policy), ValidationOutcome::NotManaged);

        // Installed wins over missing fields
        let installed = DeploymentRequest {
            installed: true,
            project_id: String::new(),
            ..request()
        };
        assert_eq!(validate(&installed, &policy), ValidationOutcome::AlreadyInstalled);

        let no_region = DeploymentRequest {
            region: String::new(),
            ..request()
        };
        assert_eq!(validate(&no_region, &policy), ValidationOutcome::MissingRegion);

        let bad_region = DeploymentRequest {
            region: "mars-north1".to_string(),
            ..request()
        };
        assert_eq!(validate(&bad_region, &policy), ValidationOutcome::RegionNotSupported);
    }

    #[test]
    fn test_outcome_errors() {
        assert_eq!(ValidationOutcome::Valid.error(), None);
        assert_eq!(ValidationOutcome::AlreadyInstalled.error(), None);
        assert_eq!(
            ValidationOutcome::RegionNotSupported.error(),
            Some(ValidationError::RegionNotSupported)
        );
    }

    #[test]
    fn test_from_cluster_deployment_reads_labels() {
        let cd: ClusterDeployment = serde_json::from_value(serde_json::json!({
            "apiVersion": "hive.openshift.io/v1alpha1",
            "kind": "ClusterDeployment",
            "metadata": {
                "name": "cluster-a",
                "namespace": "uhc-production-1",
                "labels": {
                    "hive.openshift.io/cluster-platform": "gcp",
                    "api.openshift.com/managed": "true"
                }
            },
            "spec": {
                "installed": false,
                "platform": { "gcp": { "projectID": "proj-1", "region": "us-east1" } }
            }
        }))
        .unwrap();

        assert_eq!(DeploymentRequest::from_cluster_deployment(&cd), request());
    }

    #[test]
    fn test_managed_label_must_be_true() {
        let cd: ClusterDeployment = serde_json::from_value(serde_json::json!({
            "apiVersion": "hive.openshift.io/v1alpha1",
            "kind": "ClusterDeployment",
            "metadata": {
                "name": "cluster-b",
                "namespace": "ns",
                "labels": { "api.openshift.com/managed": "yes" }
            },
            "spec": {}
        }))
        .unwrap();

        let req = DeploymentRequest::from_cluster_deployment(&cd);
        assert!(!req.managed);
        assert!(req.platform_kind.is_empty());
        assert_eq!(req.key(), "ns/cluster-b");
    }
}
