//! # ClusterDeployment
//!
//! The subset of Hive's `ClusterDeployment` resource this operator reads.
//! The CRD itself is owned and installed by Hive; unknown fields are ignored
//! on deserialization so newer Hive versions keep working.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Hive `ClusterDeployment` spec (partial)
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    group = "hive.openshift.io",
    version = "v1alpha1",
    kind = "ClusterDeployment",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentSpec {
    /// Cluster name as known to Hive
    #[serde(default)]
    pub cluster_name: String,
    /// Set by Hive once the installer has finished
    #[serde(default)]
    pub installed: bool,
    /// Per-cloud platform settings
    #[serde(default)]
    pub platform: Platform,
}

/// Platform section; only GCP is read
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub struct Platform {
    #[serde(default)]
    pub gcp: Option<GcpPlatform>,
}

/// GCP platform settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub struct GcpPlatform {
    /// Project to provision (Hive spells this `projectID`)
    #[serde(rename = "projectID", default)]
    pub project_id: String,
    /// Region the cluster is installed in
    #[serde(default)]
    pub region: String,
}
