//! GCP Project Operator Library
//!
//! Watches Hive `ClusterDeployment` resources and, for every managed GCP
//! cluster that is not installed yet, provisions a GCP project with a service
//! account and publishes the account's key as a Secret in the cluster's
//! namespace.
//!
//! The provisioning pipeline lives in [`controller::provisioning`] and only
//! talks to the outside world through the [`provider::CloudGateway`] and
//! [`store::SecretStore`] traits; [`testing`] carries in-memory doubles for
//! both.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod provider;
pub mod runtime;
pub mod store;
pub mod testing;
