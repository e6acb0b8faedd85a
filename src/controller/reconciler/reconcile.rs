//! # Reconciliation Logic
//!
//! Entry point invoked by the controller for every `ClusterDeployment` event.
//! Errors are handled by the error policy, which owns the retry schedule.

use crate::controller::provisioning::{DeploymentRequest, PassOutcome};
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::ClusterDeployment;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, Instrument};

/// Run one provisioning pass for `cd`
///
/// A successful pass waits for the next change of the object; nothing is
/// requeued on a timer.
///
/// # Errors
/// The provisioning error of the pass
pub async fn reconcile(
    cd: Arc<ClusterDeployment>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    let request = DeploymentRequest::from_cluster_deployment(&cd);

    let span = tracing::span!(
        tracing::Level::INFO,
        "reconcile",
        resource.name = request.name.as_str(),
        resource.namespace = request.namespace.as_str(),
        resource.kind = "ClusterDeployment",
        project.id = request.project_id.as_str()
    );

    metrics::increment_reconciliations();
    let result = ctx.provisioner.run(&request).instrument(span).await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    let outcome = result?;
    metrics::increment_pass_outcome(outcome.as_str());
    ctx.reset_backoff(&request.key());

    match outcome {
        PassOutcome::Provisioned => info!(
            "Reconciled {} in {:.2}s",
            request.key(),
            start.elapsed().as_secs_f64()
        ),
        PassOutcome::AlreadyInstalled | PassOutcome::SecretPresent => debug!(
            "Nothing to do for {} ({})",
            request.key(),
            outcome.as_str()
        ),
    }

    Ok(Action::await_change())
}
