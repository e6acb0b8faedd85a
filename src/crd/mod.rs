//! # Custom Resources
//!
//! Resource types read by the operator.
//!
//! - `cluster_deployment.rs` - Hive `ClusterDeployment` (external CRD, read-only)

mod cluster_deployment;

pub use cluster_deployment::{ClusterDeployment, ClusterDeploymentSpec, GcpPlatform, Platform};
