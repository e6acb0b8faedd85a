//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `gcp_project_operator_reconciliations_total` - Total number of reconciliations
//! - `gcp_project_operator_reconciliation_errors_total` - Reconciliation errors by kind
//! - `gcp_project_operator_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `gcp_project_operator_pass_outcomes_total` - Successful passes by outcome
//! - `gcp_project_operator_stage_duration_seconds` - Duration of each pipeline stage
//! - `gcp_project_operator_gateway_operations_total` - GCP API calls by operation and outcome
//! - `gcp_project_operator_gateway_operation_duration_seconds` - Duration of GCP API calls
//! - `gcp_project_operator_iam_policy_writes_total` - IAM policy updates issued
//! - `gcp_project_operator_service_account_keys_rotated_total` - Keys minted by rotation
//! - `gcp_project_operator_secrets_published_total` - Credential secrets written
//! - `gcp_project_operator_requeues_total` - Requeues scheduled by reason

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gcp_project_operator_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gcp_project_operator_reconciliation_errors_total",
            "Total number of reconciliation errors by error kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "gcp_project_operator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static PASS_OUTCOMES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gcp_project_operator_pass_outcomes_total",
            "Total number of successful reconciliation passes by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create PASS_OUTCOMES_TOTAL metric - this should never happen")
});

static STAGE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "gcp_project_operator_stage_duration_seconds",
            "Duration of provisioning pipeline stages in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["stage"],
    )
    .expect("Failed to create STAGE_DURATION metric - this should never happen")
});

static GATEWAY_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gcp_project_operator_gateway_operations_total",
            "Total number of GCP API operations by operation and outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create GATEWAY_OPERATIONS_TOTAL metric - this should never happen")
});

static GATEWAY_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "gcp_project_operator_gateway_operation_duration_seconds",
            "Duration of GCP API operations in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["operation"],
    )
    .expect("Failed to create GATEWAY_OPERATION_DURATION metric - this should never happen")
});

static IAM_POLICY_WRITES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gcp_project_operator_iam_policy_writes_total",
        "Total number of project IAM policy updates",
    )
    .expect("Failed to create IAM_POLICY_WRITES_TOTAL metric - this should never happen")
});

static SERVICE_ACCOUNT_KEYS_ROTATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gcp_project_operator_service_account_keys_rotated_total",
        "Total number of service account keys minted",
    )
    .expect("Failed to create SERVICE_ACCOUNT_KEYS_ROTATED_TOTAL metric - this should never happen")
});

static SECRETS_PUBLISHED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gcp_project_operator_secrets_published_total",
        "Total number of credential secrets published",
    )
    .expect("Failed to create SECRETS_PUBLISHED_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gcp_project_operator_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(PASS_OUTCOMES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STAGE_DURATION.clone()))?;
    REGISTRY.register(Box::new(GATEWAY_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GATEWAY_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(IAM_POLICY_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SERVICE_ACCOUNT_KEYS_ROTATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_PUBLISHED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_pass_outcome(outcome: &str) {
    PASS_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn observe_stage_duration(stage: &str, duration: f64) {
    STAGE_DURATION.with_label_values(&[stage]).observe(duration);
}

/// Record one GCP API call; `outcome` is `success` or an error kind
pub fn record_gateway_operation(operation: &str, outcome: &str, duration: f64) {
    GATEWAY_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    GATEWAY_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_iam_policy_writes() {
    IAM_POLICY_WRITES_TOTAL.inc();
}

pub fn increment_service_account_keys_rotated() {
    SERVICE_ACCOUNT_KEYS_ROTATED_TOTAL.inc();
}

pub fn increment_secrets_published() {
    SECRETS_PUBLISHED_TOTAL.inc();
}

pub fn increment_requeues(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.get();
        increment_reconciliations();
        assert_eq!(RECONCILIATIONS_TOTAL.get(), before + 1u64);
    }

    #[test]
    fn test_increment_reconciliation_errors_by_kind() {
        let before = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["provider_call"])
            .get();
        increment_reconciliation_errors("provider_call");
        let after = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["provider_call"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        observe_reconciliation_duration(1.5);
    }

    #[test]
    fn test_record_gateway_operation() {
        let before = GATEWAY_OPERATIONS_TOTAL
            .with_label_values(&["create_project", "conflict"])
            .get();
        record_gateway_operation("create_project", "conflict", 0.2);
        let after = GATEWAY_OPERATIONS_TOTAL
            .with_label_values(&["create_project", "conflict"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_stage_and_outcome_counters() {
        observe_stage_duration("ensure_project", 0.3);
        let before = PASS_OUTCOMES_TOTAL.with_label_values(&["provisioned"]).get();
        increment_pass_outcome("provisioned");
        assert_eq!(
            PASS_OUTCOMES_TOTAL.with_label_values(&["provisioned"]).get(),
            before + 1u64
        );
    }

    #[test]
    fn test_credential_counters() {
        let keys_before = SERVICE_ACCOUNT_KEYS_ROTATED_TOTAL.get();
        let secrets_before = SECRETS_PUBLISHED_TOTAL.get();
        let writes_before = IAM_POLICY_WRITES_TOTAL.get();
        increment_service_account_keys_rotated();
        increment_secrets_published();
        increment_iam_policy_writes();
        assert_eq!(SERVICE_ACCOUNT_KEYS_ROTATED_TOTAL.get(), keys_before + 1u64);
        assert_eq!(SECRETS_PUBLISHED_TOTAL.get(), secrets_before + 1u64);
        assert_eq!(IAM_POLICY_WRITES_TOTAL.get(), writes_before + 1u64);
    }

    #[test]
    fn test_increment_requeues() {
        let before = REQUEUES_TOTAL.with_label_values(&["error-backoff"]).get();
        increment_requeues("error-backoff");
        assert_eq!(
            REQUEUES_TOTAL.with_label_values(&["error-backoff"]).get(),
            before + 1u64
        );
    }
}
