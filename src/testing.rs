//! # Test Doubles
//!
//! In-memory implementations of the gateway and secret store seams, used by
//! unit and integration tests to exercise the pipeline without a cluster or
//! a GCP organization.
//!
//! [`FakeGateway`] keeps a log of every call it receives and can be told to
//! fail specific operations.

use crate::provider::model::service_account_email;
use crate::provider::{
    CloudCredentials, CloudGateway, GatewayError, GatewayFactory, IamPolicy, Operation,
    ServiceAccount, ServiceAccountKey,
};
use crate::store::{SecretData, SecretStore, SecretStoreError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct FakeKey {
    key: ServiceAccountKey,
    deletable: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<String>,
    failures: HashSet<String>,
    project_exists: bool,
    service_accounts: BTreeMap<String, ServiceAccount>,
    keys: BTreeMap<String, Vec<FakeKey>>,
    policy: IamPolicy,
    written_policies: Vec<IamPolicy>,
    enabled_services: Vec<String>,
    billing_account: Option<String>,
    sequence: u32,
}

impl FakeState {
    fn next_id(&mut self) -> u32 {
        self.sequence += 1;
        self.sequence
    }
}

/// In-memory [`CloudGateway`] for a single project
#[derive(Debug)]
pub struct FakeGateway {
    project_id: String,
    state: Mutex<FakeState>,
}

impl FakeGateway {
    #[must_use]
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            state: Mutex::new(FakeState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log `operation` and fail it if requested
    fn record(&self, operation: &str) -> Result<MutexGuard<'_, FakeState>, GatewayError> {
        let mut state = self.state();
        state.calls.push(operation.to_string());
        if state.failures.contains(operation) {
            return Err(GatewayError::Api {
                code: 500,
                status: "INTERNAL".to_string(),
                message: format!("injected failure for {operation}"),
            });
        }
        Ok(state)
    }

    /// Every operation called so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Make every future call of `operation` fail with a 500
    pub fn fail_on(&self, operation: &str) {
        self.state().failures.insert(operation.to_string());
    }

    #[must_use]
    pub fn project_exists(&self) -> bool {
        self.state().project_exists
    }

    pub fn set_project_exists(&self, exists: bool) {
        self.state().project_exists = exists;
    }

    /// Seed a service account with id `name`
    pub fn add_service_account(&self, name: &str) -> ServiceAccount {
        let mut state = self.state();
        let account = self.build_account(&mut state, name, name);
        state
            .service_accounts
            .insert(account.email.clone(), account.clone());
        account
    }

    /// Seed a key; an undeletable key rejects delete calls
    pub fn add_key(&self, email: &str, deletable: bool) -> String {
        let mut state = self.state();
        let key = self.build_key(&mut state, email);
        let name = key.name.clone();
        state
            .keys
            .entry(email.to_string())
            .or_default()
            .push(FakeKey { key, deletable });
        name
    }

    #[must_use]
    pub fn key_count(&self, email: &str) -> usize {
        self.state().keys.get(email).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn key_names(&self, email: &str) -> Vec<String> {
        self.state()
            .keys
            .get(email)
            .map(|keys| keys.iter().map(|fake| fake.key.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn set_policy(&self, policy: IamPolicy) {
        self.state().policy = policy;
    }

    /// Current project IAM policy
    #[must_use]
    pub fn policy(&self) -> IamPolicy {
        self.state().policy.clone()
    }

    /// Etag carried by the most recent `set_iam_policy` request
    #[must_use]
    pub fn last_written_etag(&self) -> Option<String> {
        self.state()
            .written_policies
            .last()
            .and_then(|policy| policy.etag.clone())
    }

    #[must_use]
    pub fn enabled_services(&self) -> Vec<String> {
        self.state().enabled_services.clone()
    }

    #[must_use]
    pub fn linked_billing_account(&self) -> Option<String> {
        self.state().billing_account.clone()
    }

    fn build_account(&self, state: &mut FakeState, name: &str, display_name: &str) -> ServiceAccount {
        let email = service_account_email(name, &self.project_id);
        ServiceAccount {
            name: format!("projects/{}/serviceAccounts/{}", self.project_id, email),
            project_id: self.project_id.clone(),
            unique_id: format!("1{:020}", state.next_id()),
            email,
            display_name: display_name.to_string(),
        }
    }

    fn build_key(&self, state: &mut FakeState, email: &str) -> ServiceAccountKey {
        let id = format!("{:040x}", state.next_id());
        let file = serde_json::json!({
            "type": "service_account",
            "project_id": self.project_id,
            "private_key_id": id,
            "client_email": email,
        });
        ServiceAccountKey {
            name: format!(
                "projects/{}/serviceAccounts/{}/keys/{}",
                self.project_id, email, id
            ),
            private_key_data: general_purpose::STANDARD.encode(file.to_string()),
            key_type: Some("USER_MANAGED".to_string()),
        }
    }
}

#[async_trait]
impl CloudGateway for FakeGateway {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn create_project(&self, _parent_folder_id: &str) -> Result<Operation, GatewayError> {
        let mut state = self.record("create_project")?;
        if state.project_exists {
            return Err(GatewayError::Conflict {
                message: "Requested entity already exists".to_string(),
            });
        }
        state.project_exists = true;
        Ok(Operation {
            name: format!("operations/cp.{}", state.next_id()),
            done: false,
        })
    }

    async fn delete_project(&self) -> Result<(), GatewayError> {
        let mut state = self.record("delete_project")?;
        if !state.project_exists {
            return Err(GatewayError::NotFound {
                message: format!("project {} not found", self.project_id),
            });
        }
        state.project_exists = false;
        Ok(())
    }

    async fn get_service_account(&self, name: &str) -> Result<ServiceAccount, GatewayError> {
        let state = self.record("get_service_account")?;
        let email = service_account_email(name, &self.project_id);
        state
            .service_accounts
            .get(&email)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                message: format!("Unknown service account {email}"),
            })
    }

    async fn create_service_account(
        &self,
        name: &str,
        display_name: &str,
    ) -> Result<ServiceAccount, GatewayError> {
        let mut state = self.record("create_service_account")?;
        let account = self.build_account(&mut state, name, display_name);
        if state.service_accounts.contains_key(&account.email) {
            return Err(GatewayError::Conflict {
                message: format!("Service account {name} already exists"),
            });
        }
        state
            .service_accounts
            .insert(account.email.clone(), account.clone());
        Ok(account)
    }

    async fn delete_service_account(&self, email: &str) -> Result<(), GatewayError> {
        let mut state = self.record("delete_service_account")?;
        state.keys.remove(email);
        state
            .service_accounts
            .remove(email)
            .map(|_| ())
            .ok_or_else(|| GatewayError::NotFound {
                message: format!("Unknown service account {email}"),
            })
    }

    async fn list_service_account_keys(
        &self,
        email: &str,
    ) -> Result<Vec<ServiceAccountKey>, GatewayError> {
        let state = self.record("list_service_account_keys")?;
        Ok(state
            .keys
            .get(email)
            .map(|keys| {
                keys.iter()
                    .map(|fake| ServiceAccountKey {
                        private_key_data: String::new(),
                        ..fake.key.clone()
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_service_account_key(&self, key_name: &str) -> Result<(), GatewayError> {
        let mut state = self.record("delete_service_account_key")?;
        for keys in state.keys.values_mut() {
            if let Some(index) = keys.iter().position(|fake| fake.key.name == key_name) {
                if !keys[index].deletable {
                    return Err(GatewayError::Api {
                        code: 400,
                        status: "FAILED_PRECONDITION".to_string(),
                        message: format!("Key {key_name} cannot be deleted"),
                    });
                }
                keys.remove(index);
                return Ok(());
            }
        }
        Err(GatewayError::NotFound {
            message: format!("Unknown key {key_name}"),
        })
    }

    async fn create_service_account_key(
        &self,
        email: &str,
    ) -> Result<ServiceAccountKey, GatewayError> {
        let mut state = self.record("create_service_account_key")?;
        let key = self.build_key(&mut state, email);
        state
            .keys
            .entry(email.to_string())
            .or_default()
            .push(FakeKey {
                key: key.clone(),
                deletable: true,
            });
        Ok(key)
    }

    async fn get_iam_policy(&self) -> Result<IamPolicy, GatewayError> {
        let state = self.record("get_iam_policy")?;
        Ok(state.policy.clone())
    }

    async fn set_iam_policy(&self, policy: &IamPolicy) -> Result<IamPolicy, GatewayError> {
        let mut state = self.record("set_iam_policy")?;
        if policy.etag.is_some() && policy.etag != state.policy.etag {
            return Err(GatewayError::Conflict {
                message: "There were concurrent policy changes".to_string(),
            });
        }
        state.written_policies.push(policy.clone());
        let etag = format!("etag-{}", state.next_id());
        state.policy = IamPolicy {
            etag: Some(etag),
            ..policy.clone()
        };
        Ok(state.policy.clone())
    }

    async fn enable_billing_api(&self, _project_id: &str) -> Result<(), GatewayError> {
        let mut state = self.record("enable_billing_api")?;
        state
            .enabled_services
            .push(crate::constants::CLOUD_BILLING_SERVICE.to_string());
        Ok(())
    }

    async fn enable_dns_api(&self, _project_id: &str) -> Result<(), GatewayError> {
        let mut state = self.record("enable_dns_api")?;
        state
            .enabled_services
            .push(crate::constants::DNS_SERVICE.to_string());
        Ok(())
    }

    async fn create_cloud_billing_account(
        &self,
        _project_id: &str,
        billing_account_id: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.record("create_cloud_billing_account")?;
        state.billing_account = Some(billing_account_id.to_string());
        Ok(())
    }
}

/// [`GatewayFactory`] handing out one shared [`FakeGateway`]
#[derive(Debug)]
pub struct FakeGatewayFactory {
    gateway: Arc<FakeGateway>,
    builds: AtomicUsize,
    fail_auth: Mutex<bool>,
}

impl FakeGatewayFactory {
    #[must_use]
    pub fn new(gateway: Arc<FakeGateway>) -> Self {
        Self {
            gateway,
            builds: AtomicUsize::new(0),
            fail_auth: Mutex::new(false),
        }
    }

    /// Number of gateways built so far
    #[must_use]
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Make every future build fail authentication
    pub fn fail_auth(&self) {
        *self.fail_auth.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }
}

#[async_trait]
impl GatewayFactory for FakeGatewayFactory {
    async fn build(
        &self,
        _project_id: &str,
        _credentials: &CloudCredentials,
    ) -> Result<Arc<dyn CloudGateway>, GatewayError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if *self.fail_auth.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(GatewayError::Auth("invalid_grant".to_string()));
        }
        let gateway: Arc<dyn CloudGateway> = Arc::clone(&self.gateway) as Arc<dyn CloudGateway>;
        Ok(gateway)
    }
}

/// In-memory [`SecretStore`]
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: Mutex<BTreeMap<(String, String), SecretData>>,
}

impl InMemorySecretStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, namespace: &str, name: &str, data: SecretData) {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((namespace.to_string(), name.to_string()), data);
    }

    #[must_use]
    pub fn get(&self, namespace: &str, name: &str) -> Option<SecretData> {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Names of all secrets in `namespace`
    #[must_use]
    pub fn names_in(&self, namespace: &str) -> Vec<String> {
        self.secrets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.clone())
            .collect()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, SecretStoreError> {
        Ok(self.get(namespace, name))
    }

    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: SecretData,
    ) -> Result<(), SecretStoreError> {
        let mut secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (namespace.to_string(), name.to_string());
        if secrets.contains_key(&key) {
            return Err(SecretStoreError::AlreadyExists {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        secrets.insert(key, data);
        Ok(())
    }
}
