//! Common test utilities for integration and Pact tests
//!
//! Provides rustls setup for the Pact tests and fixtures for driving the
//! provisioning pipeline against the in-memory doubles.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use gcp_project_operator::config::OperatorPolicy;
use gcp_project_operator::constants::{BILLING_ACCOUNT_KEY, SERVICE_ACCOUNT_JSON_KEY};
use gcp_project_operator::controller::provisioning::{DeploymentRequest, Provisioner};
use gcp_project_operator::provider::GatewayFactory;
use gcp_project_operator::store::{SecretData, SecretStore};
use gcp_project_operator::testing::{FakeGateway, FakeGatewayFactory, InMemorySecretStore};
use std::sync::{Arc, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Base URL of a Pact mock server without the trailing slash
pub fn base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

pub const PROJECT_ID: &str = "proj-1";
pub const NAMESPACE: &str = "uhc-production-1";
pub const BILLING_ACCOUNT: &str = "0000AA-1111BB-2222CC";

/// A valid request for a managed GCP cluster that is not installed yet
pub fn request() -> DeploymentRequest {
    DeploymentRequest {
        namespace: NAMESPACE.to_string(),
        name: "cluster-a".to_string(),
        project_id: PROJECT_ID.to_string(),
        region: "us-east1".to_string(),
        platform_kind: "gcp".to_string(),
        installed: false,
        managed: true,
    }
}

/// Provisioner wired to in-memory doubles
pub struct Harness {
    pub gateway: Arc<FakeGateway>,
    pub factory: Arc<FakeGatewayFactory>,
    pub store: Arc<InMemorySecretStore>,
    pub provisioner: Provisioner,
}

impl Harness {
    /// Harness with the organization secret already in place
    pub fn new() -> Self {
        let harness = Self::without_org_secret();
        let policy = harness.provisioner.policy();
        harness.store.insert(
            &policy.operator_namespace,
            &policy.org_secret_name,
            org_secret(),
        );
        harness
    }

    pub fn without_org_secret() -> Self {
        let gateway = Arc::new(FakeGateway::new(PROJECT_ID));
        let factory = Arc::new(FakeGatewayFactory::new(Arc::clone(&gateway)));
        let store = Arc::new(InMemorySecretStore::new());
        let secrets: Arc<dyn SecretStore> = Arc::clone(&store) as Arc<dyn SecretStore>;
        let gateways: Arc<dyn GatewayFactory> = Arc::clone(&factory) as Arc<dyn GatewayFactory>;
        let provisioner = Provisioner::new(Arc::new(OperatorPolicy::default()), secrets, gateways);
        Self {
            gateway,
            factory,
            store,
            provisioner,
        }
    }

    pub fn service_account_email(&self) -> String {
        format!(
            "{}@{}.iam.gserviceaccount.com",
            self.provisioner.policy().service_account_name,
            PROJECT_ID
        )
    }
}

/// Organization secret contents
pub fn org_secret() -> SecretData {
    SecretData::from([
        (
            SERVICE_ACCOUNT_JSON_KEY.to_string(),
            br#"{"type":"service_account","client_email":"org@example.iam.gserviceaccount.com"}"#
                .to_vec(),
        ),
        (
            BILLING_ACCOUNT_KEY.to_string(),
            format!("{BILLING_ACCOUNT}\n").into_bytes(),
        ),
    ])
}
