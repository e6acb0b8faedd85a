//! # Controller Configuration
//!
//! Operator-level settings loaded from environment variables.

use crate::provider::gcp::GcpEndpoints;
use std::time::Duration;

/// Operator-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
/// Values are read once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Port of the metrics/probe HTTP server
    pub metrics_port: u16,
    /// How long to wait for the HTTP server to become ready (seconds)
    pub server_startup_timeout_secs: u64,
    /// Readiness poll interval while waiting for the HTTP server (milliseconds)
    pub server_poll_interval_ms: u64,
    /// First retry delay after a failed pass (seconds)
    pub backoff_min_secs: u64,
    /// Upper bound for the retry delay (seconds)
    pub backoff_max_secs: u64,
    /// Delay before restarting the watch stream after it ends (seconds)
    pub watch_restart_delay_secs: u64,
    /// Maximum ClusterDeployments reconciled at the same time
    /// Passes for the same object never overlap regardless of this value
    pub max_concurrent_reconciliations: u16,
    /// Namespace holding the organization credentials secret
    pub operator_namespace: String,
    /// Folder new projects are created under
    pub parent_folder_id: String,
    /// Timeout for a single GCP HTTP request (seconds)
    pub gcp_http_timeout_secs: u64,
    /// GCP API base URLs (overridable for contract tests and private endpoints)
    pub gcp_endpoints: GcpEndpoints,
    /// Log filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            operator_namespace: DEFAULT_OPERATOR_NAMESPACE.to_string(),
            parent_folder_id: DEFAULT_PARENT_FOLDER_ID.to_string(),
            gcp_http_timeout_secs: DEFAULT_GCP_HTTP_TIMEOUT_SECS,
            gcp_endpoints: GcpEndpoints::default(),
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        use crate::constants::*;
        let defaults = GcpEndpoints::default();
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            server_startup_timeout_secs: env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            server_poll_interval_ms: env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
            backoff_min_secs: backoff_secs_or_default("BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS),
            backoff_max_secs: backoff_secs_or_default("BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            operator_namespace: env_var_or_default_str(
                "OPERATOR_NAMESPACE",
                DEFAULT_OPERATOR_NAMESPACE,
            ),
            parent_folder_id: env_var_or_default_str(
                "GCP_PARENT_FOLDER_ID",
                DEFAULT_PARENT_FOLDER_ID,
            ),
            gcp_http_timeout_secs: env_var_or_default(
                "GCP_HTTP_TIMEOUT_SECS",
                DEFAULT_GCP_HTTP_TIMEOUT_SECS,
            ),
            gcp_endpoints: GcpEndpoints {
                resource_manager: env_var_or_default_str(
                    "GCP_RESOURCE_MANAGER_ENDPOINT",
                    &defaults.resource_manager,
                ),
                iam: env_var_or_default_str("GCP_IAM_ENDPOINT", &defaults.iam),
                service_management: env_var_or_default_str(
                    "GCP_SERVICE_MANAGEMENT_ENDPOINT",
                    &defaults.service_management,
                ),
                cloud_billing: env_var_or_default_str(
                    "GCP_CLOUD_BILLING_ENDPOINT",
                    &defaults.cloud_billing,
                ),
                token_uri: std::env::var("GCP_TOKEN_URI").ok(),
            },
            log_level: env_var_or_default_str("LOG_LEVEL", "info"),
            log_format: env_var_or_default_str("LOG_FORMAT", "json"),
        }
    }

    /// Get GCP HTTP request timeout
    #[must_use]
    pub fn gcp_http_timeout(&self) -> Duration {
        Duration::from_secs(self.gcp_http_timeout_secs)
    }

    /// Get watch restart delay duration
    #[must_use]
    pub fn watch_restart_delay(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    /// Get server startup timeout duration
    #[must_use]
    pub fn server_startup_timeout(&self) -> Duration {
        Duration::from_secs(self.server_startup_timeout_secs)
    }

    /// Get server readiness poll interval
    #[must_use]
    pub fn server_poll_interval(&self) -> Duration {
        Duration::from_millis(self.server_poll_interval_ms)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a backoff bound in seconds, capped at [`BACKOFF_CEILING_SECS`]
///
/// [`BACKOFF_CEILING_SECS`]: crate::constants::BACKOFF_CEILING_SECS
fn backoff_secs_or_default(key: &str, default: u64) -> u64 {
    env_var_or_default(key, default).min(crate::constants::BACKOFF_CEILING_SECS)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
