//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::ClusterDeployment;
use crate::observability::metrics;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Decide when a failed `ClusterDeployment` is looked at again
///
/// Validation failures wait for the object to change. Every other failure is
/// retried with a per-object Fibonacci backoff, reset by the next success.
pub fn handle_reconciliation_error(
    obj: Arc<ClusterDeployment>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.reconciliation_error",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        error.kind = error.kind()
    );
    let _error_guard = error_span.enter();

    if let Some(validation) = error.validation() {
        if validation.is_foreign() {
            debug!("Ignoring {}/{}: {}", namespace, name, validation);
        } else {
            warn!(
                "ClusterDeployment {}/{} is invalid: {} (waiting for it to change)",
                namespace, name, validation
            );
            metrics::increment_reconciliation_errors(error.kind());
        }
        return Action::await_change();
    }

    error!("Reconciliation error for {}/{}: {}", namespace, name, error);
    metrics::increment_reconciliation_errors(error.kind());

    let resource_key = format!("{namespace}/{name}");
    let (backoff_seconds, error_count) = ctx.next_backoff(&resource_key);

    let next_trigger_time = next_retry_time(chrono::Utc::now(), backoff_seconds)
        .map_or_else(|| "never".to_string(), |time| time.to_rfc3339());
    info!(
        "Retrying {} in {}s at {} (error count: {})",
        resource_key, backoff_seconds, next_trigger_time, error_count
    );

    metrics::increment_requeues("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}

/// Wall-clock time of the next retry; `None` when it is out of range
fn next_retry_time(
    now: chrono::DateTime<chrono::Utc>,
    backoff_seconds: u64,
) -> Option<chrono::DateTime<chrono::Utc>> {
    let delay = chrono::Duration::try_seconds(i64::try_from(backoff_seconds).ok()?)?;
    now.checked_add_signed(delay)
}

/// Broad class of a watch stream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorClass {
    /// 401: RBAC revoked or token expired
    Unauthorized,
    /// 410: resource version too old, normal after restarts
    Expired,
    /// 429: API server throttling or storage reinitializing
    Throttled,
    /// 404: the ClusterDeployment CRD is missing
    NotFound,
    Other,
}

/// Classify a watch error from its rendered message
///
/// 404 is checked before 401: a plain-text 404 body surfaces as a
/// deserialization error whose text also mentions the failed watch.
#[must_use]
pub fn classify_watch_error(message: &str) -> WatchErrorClass {
    let is_not_found = message.contains("ObjectNotFound")
        || message.contains("404")
        || message.contains("not found");
    if is_not_found {
        return WatchErrorClass::NotFound;
    }
    if message.contains("401") || message.contains("Unauthorized") {
        return WatchErrorClass::Unauthorized;
    }
    if message.contains("410")
        || message.contains("too old resource version")
        || message.contains("Expired")
        || message.contains("Gone")
    {
        return WatchErrorClass::Expired;
    }
    if message.contains("429")
        || message.contains("storage is (re)initializing")
        || message.contains("TooManyRequests")
    {
        return WatchErrorClass::Throttled;
    }
    WatchErrorClass::Other
}

/// Log a watch stream error with operator guidance
pub fn log_watch_stream_error(message: &str) {
    match classify_watch_error(message) {
        WatchErrorClass::Unauthorized => {
            error!("Watch authentication failed (401 Unauthorized): {}", message);
            error!("Verify the operator ClusterRole still grants list/watch on clusterdeployments.hive.openshift.io");
        }
        WatchErrorClass::Expired => {
            warn!("Watch resource version expired (410), the watch will resync");
        }
        WatchErrorClass::Throttled => {
            warn!("API server throttling the watch (429): {}", message);
        }
        WatchErrorClass::NotFound => {
            warn!(
                "ClusterDeployment resource not found (404), is the Hive CRD installed? {}",
                message
            );
        }
        WatchErrorClass::Other => {
            error!("Controller stream error: {}", message);
        }
    }
}
