//! # Initialization
//!
//! Operator initialization logic including rustls setup, tracing, metrics,
//! server startup, Kubernetes client setup and wiring of the provisioning
//! pipeline to its GCP and Secret backends.

use crate::config::{ControllerConfig, OperatorPolicy};
use crate::controller::provisioning::Provisioner;
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::ClusterDeployment;
use crate::observability;
use crate::provider::gcp::GcpGatewayFactory;
use crate::store::KubeSecretStore;
use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};
use tracing_subscriber::EnvFilter;

/// Initialization result containing all necessary components for the operator
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// API for ClusterDeployment resources in all namespaces
    pub deployments: Api<ClusterDeployment>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

/// Initialize the operator runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
/// - Provisioner and reconciler setup
///
/// # Errors
/// Any step above failing
pub async fn initialize(config: &ControllerConfig) -> Result<InitializationResult> {
    // Must run before anything opens a TLS connection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|provider| {
            anyhow::anyhow!("Failed to install rustls crypto provider: {provider:?}")
        })?;

    init_tracing(config)?;

    info!("Starting GCP Project Operator");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());

    let server_state_clone = Arc::clone(&server_state);
    let server_port = config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_server_ready(&server_state, &server_handle, config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    // Hive creates ClusterDeployments in per-cluster namespaces
    let deployments: Api<ClusterDeployment> = Api::all(client.clone());

    let policy = Arc::new(OperatorPolicy::from_config(config));
    let secrets = Arc::new(KubeSecretStore::new(client.clone()));
    let gateways = Arc::new(
        GcpGatewayFactory::new(config.gcp_endpoints.clone(), config.gcp_http_timeout())
            .context("Failed to build GCP HTTP client")?,
    );

    info!(
        "Provisioning policy: org secret {}/{}, parent folder {}, {} roles, {} regions",
        policy.operator_namespace,
        policy.org_secret_name,
        policy.parent_folder_id,
        policy.required_roles.len(),
        policy.supported_regions.len()
    );

    let provisioner = Provisioner::new(policy, secrets, gateways);
    let reconciler = Arc::new(Reconciler::new(provisioner, config));

    summarize_existing_deployments(&deployments).await;

    info!("Operator initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        deployments,
        reconciler,
        server_state,
    })
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `LOG_LEVEL` when set.
fn init_tracing(config: &ControllerConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gcp_project_operator={}", config.log_level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.log_format.eq_ignore_ascii_case("text") {
        builder.try_init()
    } else {
        builder.json().try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    config: &ControllerConfig,
) -> Result<()> {
    let startup_timeout = config.server_startup_timeout();
    let poll_interval = config.server_poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}

/// Log a per-namespace summary of the ClusterDeployments present at startup
///
/// The controller lists everything itself when the watch starts; this only
/// checks that the resource is queryable and gives operators a starting view.
async fn summarize_existing_deployments(deployments: &Api<ClusterDeployment>) {
    let span = tracing::span!(
        tracing::Level::INFO,
        "operator.startup.summarize_existing",
        resource.kind = "ClusterDeployment"
    );
    let listed = deployments
        .list(&ListParams::default())
        .instrument(span.clone())
        .await;
    let _guard = span.enter();

    let list = match listed {
        Ok(list) => list,
        Err(e) => {
            warn!(
                "ClusterDeployment is not queryable yet ({}), the watch will keep retrying",
                e
            );
            return;
        }
    };

    let mut by_namespace: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in &list.items {
        by_namespace
            .entry(item.namespace().unwrap_or_default())
            .or_default()
            .push(item.name_any());
    }

    info!(
        "Found {} existing ClusterDeployments in {} namespaces",
        list.items.len(),
        by_namespace.len()
    );
    for (namespace, mut names) in by_namespace {
        names.sort();
        let shown = if names.len() <= 3 {
            names.join(", ")
        } else {
            format!("{}, ... ({} total)", names[..3].join(", "), names.len())
        };
        info!("  {}: {}", namespace, shown);
    }
}
