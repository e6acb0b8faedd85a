//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! The contract tables (required roles, supported regions, secret names) are
//! copied into [`crate::config::OperatorPolicy`] at startup and passed by
//! reference from there; nothing reads them as global state during a pass.
//! Runtime defaults can be overridden via environment variables where noted
//! in [`crate::config::ControllerConfig`].

/// Name used as field manager and `app.kubernetes.io/managed-by` value
pub const OPERATOR_NAME: &str = "gcp-project-operator";

/// Provider tag a `ClusterDeployment` must carry to be handled here
pub const PROVIDER_TAG: &str = "gcp";

/// Label carrying the cluster platform (`gcp`, `aws`, ...)
pub const CLUSTER_PLATFORM_LABEL: &str = "hive.openshift.io/cluster-platform";

/// Label marking a cluster as managed (`"true"`)
pub const CLUSTER_MANAGED_LABEL: &str = "api.openshift.com/managed";

/// Namespace holding the organization credentials secret
pub const DEFAULT_OPERATOR_NAMESPACE: &str = "gcp-project-operator";

/// Organization credentials secret (auth blob + billing account)
pub const ORG_SECRET_NAME: &str = "gcp-project-operator";

/// Key of the service account JSON in both the org and the output secret
pub const SERVICE_ACCOUNT_JSON_KEY: &str = "osServiceAccount.json";

/// Key of the billing account id in the org secret
pub const BILLING_ACCOUNT_KEY: &str = "billingaccount";

/// Output secret created in the request namespace
pub const OUTPUT_SECRET_NAME: &str = "gcp";

/// Service account created in every provisioned project
pub const SERVICE_ACCOUNT_NAME: &str = "osd-managed-admin";

/// Folder new projects are created under (Service Delivery org subfolder)
pub const DEFAULT_PARENT_FOLDER_ID: &str = "240634451310";

/// Roles the service account must hold on the project
pub const REQUIRED_ROLES: [&str; 7] = [
    "roles/storage.admin",
    "roles/iam.serviceAccountUser",
    "roles/iam.serviceAccountKeyAdmin",
    "roles/iam.serviceAccountAdmin",
    "roles/iam.securityAdmin",
    "roles/dns.admin",
    "roles/compute.admin",
];

/// Regions a cluster may be requested in
pub const SUPPORTED_REGIONS: [&str; 20] = [
    "asia-east1",
    "asia-east2",
    "asia-northeast1",
    "asia-northeast2",
    "asia-south1",
    "asia-southeast1",
    "australia-southeast1",
    "europe-north1",
    "europe-west1",
    "europe-west2",
    "europe-west3",
    "europe-west4",
    "europe-west6",
    "northamerica-northeast1",
    "southamerica-east1",
    "us-central1",
    "us-east1",
    "us-east4",
    "us-west1",
    "us-west2",
];

/// Service Management name of the Cloud Billing API
pub const CLOUD_BILLING_SERVICE: &str = "cloudbilling.googleapis.com";

/// Service Management name of the Cloud DNS API
pub const DNS_SERVICE: &str = "dns.googleapis.com";

/// OAuth2 scope requested for every GCP call
pub const GCP_CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default first retry delay after a failed pass (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 30;

/// Default retry delay cap after repeated failures (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 600;

/// Upper bound accepted for either backoff setting (one day)
pub const BACKOFF_CEILING_SECS: u64 = 86_400;

/// Default delay before restarting the watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default number of ClusterDeployments reconciled at the same time
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 4;

/// Default timeout for a single GCP HTTP request (seconds)
pub const DEFAULT_GCP_HTTP_TIMEOUT_SECS: u64 = 60;
