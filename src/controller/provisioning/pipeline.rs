//! # Provisioning Pipeline
//!
//! Runs the stages of one provisioning pass in a fixed order, stopping at the
//! first failure. Every stage is safe to repeat, so a failed pass is simply
//! run again from the top on the next reconciliation.

use super::error::ProvisionError;
use super::validation::{validate, DeploymentRequest, ValidationOutcome};
use super::{activation, credentials, identity, policy, project, publish, rotation};
use crate::config::OperatorPolicy;
use crate::observability::metrics;
use crate::provider::{CloudCredentials, CloudGateway, GatewayFactory, ServiceAccount, ServiceAccountKey};
use crate::store::SecretStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// One step of a provisioning pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ResolveCredentials,
    ConnectGateway,
    EnsureProject,
    ActivateApis,
    EnsureIdentity,
    ReconcilePolicy,
    RotateCredential,
    PublishSecret,
}

impl Stage {
    /// Execution order
    pub const ORDER: [Stage; 8] = [
        Stage::ResolveCredentials,
        Stage::ConnectGateway,
        Stage::EnsureProject,
        Stage::ActivateApis,
        Stage::EnsureIdentity,
        Stage::ReconcilePolicy,
        Stage::RotateCredential,
        Stage::PublishSecret,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ResolveCredentials => "resolve_credentials",
            Stage::ConnectGateway => "connect_gateway",
            Stage::EnsureProject => "ensure_project",
            Stage::ActivateApis => "activate_apis",
            Stage::EnsureIdentity => "ensure_identity",
            Stage::ReconcilePolicy => "reconcile_policy",
            Stage::RotateCredential => "rotate_credential",
            Stage::PublishSecret => "publish_secret",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful end of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every stage ran and the output secret was published
    Provisioned,
    /// The cluster is already installed; nothing was touched
    AlreadyInstalled,
    /// The output secret exists; nothing was touched
    SecretPresent,
}

impl PassOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PassOutcome::Provisioned => "provisioned",
            PassOutcome::AlreadyInstalled => "already_installed",
            PassOutcome::SecretPresent => "secret_present",
        }
    }
}

/// Outputs handed from earlier stages to later ones
#[derive(Default)]
struct PassState {
    credentials: Option<CloudCredentials>,
    gateway: Option<Arc<dyn CloudGateway>>,
    identity: Option<ServiceAccount>,
    key: Option<ServiceAccountKey>,
}

impl PassState {
    fn credentials(&self, stage: Stage) -> Result<&CloudCredentials, ProvisionError> {
        self.credentials
            .as_ref()
            .ok_or(ProvisionError::StageOrder { stage })
    }

    fn gateway(&self, stage: Stage) -> Result<Arc<dyn CloudGateway>, ProvisionError> {
        self.gateway
            .as_ref()
            .map(Arc::clone)
            .ok_or(ProvisionError::StageOrder { stage })
    }

    fn identity(&self, stage: Stage) -> Result<&ServiceAccount, ProvisionError> {
        self.identity
            .as_ref()
            .ok_or(ProvisionError::StageOrder { stage })
    }

    fn key(&self, stage: Stage) -> Result<&ServiceAccountKey, ProvisionError> {
        self.key.as_ref().ok_or(ProvisionError::StageOrder { stage })
    }
}

/// Drives a [`DeploymentRequest`] through the provisioning stages
#[derive(Clone)]
pub struct Provisioner {
    policy: Arc<OperatorPolicy>,
    secrets: Arc<dyn SecretStore>,
    gateways: Arc<dyn GatewayFactory>,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    #[must_use]
    pub fn new(
        policy: Arc<OperatorPolicy>,
        secrets: Arc<dyn SecretStore>,
        gateways: Arc<dyn GatewayFactory>,
    ) -> Self {
        Self {
            policy,
            secrets,
            gateways,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &OperatorPolicy {
        &self.policy
    }

    /// Run one provisioning pass for `request`
    ///
    /// Validation and the output-secret check run before any provider call;
    /// either can end the pass early without touching the cloud.
    ///
    /// # Errors
    /// The error of the first failing check or stage
    pub async fn run(&self, request: &DeploymentRequest) -> Result<PassOutcome, ProvisionError> {
        let outcome = validate(request, &self.policy);
        if outcome == ValidationOutcome::AlreadyInstalled {
            debug!("{} is already installed, skipping", request.key());
            return Ok(PassOutcome::AlreadyInstalled);
        }
        if let Some(err) = outcome.error() {
            return Err(err.into());
        }

        if publish::output_secret_exists(
            self.secrets.as_ref(),
            &request.namespace,
            &self.policy.output_secret_name,
        )
        .await?
        {
            debug!(
                "Secret {}/{} already present, skipping",
                request.namespace, self.policy.output_secret_name
            );
            return Ok(PassOutcome::SecretPresent);
        }

        info!(
            "Provisioning project {} for {}",
            request.project_id,
            request.key()
        );

        let mut state = PassState::default();
        for stage in Stage::ORDER {
            let span = info_span!("provision.stage", stage = stage.as_str());
            let start = Instant::now();
            let result = self
                .run_stage(stage, request, &mut state)
                .instrument(span)
                .await;
            metrics::observe_stage_duration(stage.as_str(), start.elapsed().as_secs_f64());
            result?;
        }

        info!(
            "Project {} provisioned for {}",
            request.project_id,
            request.key()
        );
        Ok(PassOutcome::Provisioned)
    }

    async fn run_stage(
        &self,
        stage: Stage,
        request: &DeploymentRequest,
        state: &mut PassState,
    ) -> Result<(), ProvisionError> {
        match stage {
            Stage::ResolveCredentials => {
                let credentials = credentials::resolve(
                    self.secrets.as_ref(),
                    &self.policy.operator_namespace,
                    &self.policy.org_secret_name,
                )
                .await?;
                state.credentials = Some(credentials);
            }
            Stage::ConnectGateway => {
                let gateway = self
                    .gateways
                    .build(&request.project_id, state.credentials(stage)?)
                    .await
                    .map_err(|e| {
                        ProvisionError::provider(
                            stage,
                            format!("project_id={}", request.project_id),
                            e,
                        )
                    })?;
                state.gateway = Some(gateway);
            }
            Stage::EnsureProject => {
                let gateway = state.gateway(stage)?;
                project::ensure_project(gateway.as_ref(), &self.policy.parent_folder_id).await?;
            }
            Stage::ActivateApis => {
                let gateway = state.gateway(stage)?;
                let billing_account_id = &state.credentials(stage)?.billing_account_id;
                activation::activate(gateway.as_ref(), &request.project_id, billing_account_id)
                    .await?;
            }
            Stage::EnsureIdentity => {
                let gateway = state.gateway(stage)?;
                let account =
                    identity::ensure_identity(gateway.as_ref(), &self.policy.service_account_name)
                        .await?;
                state.identity = Some(account);
            }
            Stage::ReconcilePolicy => {
                let gateway = state.gateway(stage)?;
                let principal = state.identity(stage)?.principal();
                policy::apply_policy(gateway.as_ref(), &self.policy.required_roles, &principal)
                    .await?;
            }
            Stage::RotateCredential => {
                let gateway = state.gateway(stage)?;
                let email = state.identity(stage)?.email.clone();
                let key = rotation::rotate(gateway.as_ref(), &email).await?;
                state.key = Some(key);
            }
            Stage::PublishSecret => {
                publish::publish(
                    self.secrets.as_ref(),
                    &request.namespace,
                    &self.policy.output_secret_name,
                    state.key(stage)?,
                )
                .await?;
            }
        }
        Ok(())
    }
}
