//! # Provisioning
//!
//! The reconciliation core: turns a `ClusterDeployment` into a GCP project
//! with billing, DNS, a service account holding the required roles, and a
//! published service account key.
//!
//! Stages, in order:
//! - [`credentials`] - load the organization credentials
//! - [`project`] - create the project (already-exists is fine)
//! - [`activation`] - enable billing/DNS APIs and link billing
//! - [`identity`] - ensure the service account exists
//! - [`policy`] - grant the required roles
//! - [`rotation`] - keep one key and mint a new one
//! - [`publish`] - write the key into the request namespace

pub mod activation;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod policy;
pub mod project;
pub mod publish;
pub mod rotation;
pub mod validation;

pub use error::{ProvisionError, ValidationError};
pub use pipeline::{PassOutcome, Provisioner, Stage};
pub use validation::{validate, DeploymentRequest, ValidationOutcome};
