//! # GCP Project Operator
//!
//! Kubernetes operator that provisions a GCP project, service account and
//! credential secret for each managed GCP `ClusterDeployment`.
//!
//! Configuration is read from the environment, see
//! [`ControllerConfig::from_env`](gcp_project_operator::config::ControllerConfig::from_env).

use anyhow::Result;
use gcp_project_operator::config::ControllerConfig;
use gcp_project_operator::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ControllerConfig::from_env();

    let init_result = initialize(&config).await?;

    run_watch_loop(
        init_result.deployments,
        init_result.reconciler,
        init_result.server_state,
        &config,
    )
    .await
}
