//! GCP REST gateway
//!
//! Native REST implementation of [`CloudGateway`] over the Cloud Resource
//! Manager, IAM, Service Management and Cloud Billing v1 APIs. Uses reqwest
//! for HTTP and a service account JWT exchange for authentication.
//!
//! Talking plain REST keeps the gateway usable against Pact mock servers.
//!
//! References:
//! - [Resource Manager v1](https://cloud.google.com/resource-manager/reference/rest)
//! - [IAM v1](https://cloud.google.com/iam/docs/reference/rest)
//! - [Service Management v1](https://cloud.google.com/service-infrastructure/docs/service-management/reference/rest)
//! - [Cloud Billing v1](https://cloud.google.com/billing/docs/reference/rest)

mod auth;
mod paths;

pub use auth::fetch_access_token;
pub use paths::GcpEndpoints;

use crate::constants::{CLOUD_BILLING_SERVICE, DNS_SERVICE};
use crate::observability::metrics;
use crate::provider::model::{service_account_email, IamPolicy, Operation, ServiceAccount, ServiceAccountKey};
use crate::provider::{CloudCredentials, CloudGateway, GatewayError, GatewayFactory};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, Instrument};
use zeroize::Zeroizing;

// ============================================================================
// Request Structures
// ============================================================================

/// `POST /v1/projects`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectRequest<'a> {
    project_id: &'a str,
    name: &'a str,
    parent: ResourceId<'a>,
}

#[derive(Debug, Serialize)]
struct ResourceId<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    id: &'a str,
}

/// `POST /v1/projects/{project}/serviceAccounts`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateServiceAccountRequest<'a> {
    account_id: &'a str,
    service_account: ServiceAccountSpec<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceAccountSpec<'a> {
    display_name: &'a str,
}

/// `POST /v1/projects/{project}:setIamPolicy`
#[derive(Debug, Serialize)]
struct SetIamPolicyRequest<'a> {
    policy: &'a IamPolicy,
}

/// `POST /v1/services/{service}:enable`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnableServiceRequest {
    consumer_id: String,
}

/// `PUT /v1/projects/{project}/billingInfo`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectBillingInfo {
    billing_account_name: String,
    billing_enabled: bool,
}

// ============================================================================
// Response Structures
// ============================================================================

/// `GET /v1/projects/{project}/serviceAccounts/{email}/keys`
#[derive(Debug, Default, Deserialize)]
struct ListServiceAccountKeysResponse {
    #[serde(default)]
    keys: Vec<ServiceAccountKey>,
}

/// Discarded response body
#[derive(Debug, Default, Deserialize)]
struct Empty {}

/// GCP REST gateway bound to one project
pub struct GcpGateway {
    http_client: Client,
    endpoints: GcpEndpoints,
    project_id: String,
    access_token: Zeroizing<String>,
}

impl std::fmt::Debug for GcpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpGateway")
            .field("project_id", &self.project_id)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl GcpGateway {
    /// Build a gateway around an already obtained bearer token
    #[must_use]
    pub fn with_access_token(
        http_client: Client,
        endpoints: GcpEndpoints,
        project_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            endpoints,
            project_id: project_id.into(),
            access_token: Zeroizing::new(access_token.into()),
        }
    }

    /// Authenticate with `credentials` and bind to `project_id`
    ///
    /// # Errors
    /// Returns an error if the credentials are unusable or the token exchange fails
    pub async fn connect(
        http_client: Client,
        endpoints: GcpEndpoints,
        project_id: &str,
        credentials: &CloudCredentials,
    ) -> Result<Self, GatewayError> {
        let token = fetch_access_token(
            &http_client,
            &credentials.auth_json,
            endpoints.token_uri.as_deref(),
        )
        .await?;
        Ok(Self::with_access_token(
            http_client,
            endpoints,
            project_id,
            token,
        ))
    }

    /// Build HTTP request with authentication headers
    fn make_request(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .http_client
            .request(method, url)
            .bearer_auth(self.access_token.as_str());

        if let Some(body) = body {
            request = request.json(&body);
        }

        request
    }

    /// Send one API call, classify failures and record metrics
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        url: String,
        body: Option<serde_json::Value>,
    ) -> Result<T, GatewayError> {
        let span = info_span!(
            "gcp.api",
            operation = operation,
            project.id = %self.project_id
        );

        async move {
            let start = Instant::now();
            let result = self.execute(operation, method, &url, body).await;
            let outcome = match &result {
                Ok(_) => "success",
                Err(e) => e.kind(),
            };
            metrics::record_gateway_operation(operation, outcome, start.elapsed().as_secs_f64());
            result
        }
        .instrument(span)
        .await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, GatewayError> {
        debug!("{} {}", method, url);
        let response = self.make_request(method, url, body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!("{} failed with HTTP {}", operation, status.as_u16());
            return Err(GatewayError::from_response(status.as_u16(), &text));
        }

        let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| GatewayError::Decode {
            operation,
            message: e.to_string(),
        })
    }

    fn to_body<B: Serialize>(operation: &'static str, body: &B) -> Result<serde_json::Value, GatewayError> {
        serde_json::to_value(body).map_err(|e| GatewayError::Decode {
            operation,
            message: format!("failed to encode request: {e}"),
        })
    }

    async fn enable_service(&self, service: &str, project_id: &str) -> Result<(), GatewayError> {
        let request = EnableServiceRequest {
            consumer_id: format!("project:{project_id}"),
        };
        let _: Operation = self
            .call(
                "enable_service",
                Method::POST,
                paths::url(
                    &self.endpoints.service_management,
                    &paths::enable_service(service),
                ),
                Some(Self::to_body("enable_service", &request)?),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CloudGateway for GcpGateway {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn create_project(&self, parent_folder_id: &str) -> Result<Operation, GatewayError> {
        let request = CreateProjectRequest {
            project_id: &self.project_id,
            name: &self.project_id,
            parent: ResourceId {
                kind: "folder",
                id: parent_folder_id,
            },
        };
        self.call(
            "create_project",
            Method::POST,
            paths::url(&self.endpoints.resource_manager, &paths::projects()),
            Some(Self::to_body("create_project", &request)?),
        )
        .await
    }

    async fn delete_project(&self) -> Result<(), GatewayError> {
        let _: Empty = self
            .call(
                "delete_project",
                Method::DELETE,
                paths::url(
                    &self.endpoints.resource_manager,
                    &paths::project(&self.project_id),
                ),
                None,
            )
            .await?;
        Ok(())
    }

    async fn get_service_account(&self, name: &str) -> Result<ServiceAccount, GatewayError> {
        let email = service_account_email(name, &self.project_id);
        self.call(
            "get_service_account",
            Method::GET,
            paths::url(
                &self.endpoints.iam,
                &paths::service_account(&self.project_id, &email),
            ),
            None,
        )
        .await
    }

    async fn create_service_account(
        &self,
        name: &str,
        display_name: &str,
    ) -> Result<ServiceAccount, GatewayError> {
        let request = CreateServiceAccountRequest {
            account_id: name,
            service_account: ServiceAccountSpec { display_name },
        };
        self.call(
            "create_service_account",
            Method::POST,
            paths::url(
                &self.endpoints.iam,
                &paths::service_accounts(&self.project_id),
            ),
            Some(Self::to_body("create_service_account", &request)?),
        )
        .await
    }

    async fn delete_service_account(&self, email: &str) -> Result<(), GatewayError> {
        let _: Empty = self
            .call(
                "delete_service_account",
                Method::DELETE,
                paths::url(
                    &self.endpoints.iam,
                    &paths::service_account(&self.project_id, email),
                ),
                None,
            )
            .await?;
        Ok(())
    }

    async fn list_service_account_keys(
        &self,
        email: &str,
    ) -> Result<Vec<ServiceAccountKey>, GatewayError> {
        let response: ListServiceAccountKeysResponse = self
            .call(
                "list_service_account_keys",
                Method::GET,
                paths::url(
                    &self.endpoints.iam,
                    &paths::service_account_keys(&self.project_id, email),
                ),
                None,
            )
            .await?;
        Ok(response.keys)
    }

    async fn delete_service_account_key(&self, key_name: &str) -> Result<(), GatewayError> {
        let _: Empty = self
            .call(
                "delete_service_account_key",
                Method::DELETE,
                paths::url(&self.endpoints.iam, key_name),
                None,
            )
            .await?;
        Ok(())
    }

    async fn create_service_account_key(
        &self,
        email: &str,
    ) -> Result<ServiceAccountKey, GatewayError> {
        self.call(
            "create_service_account_key",
            Method::POST,
            paths::url(
                &self.endpoints.iam,
                &paths::service_account_keys(&self.project_id, email),
            ),
            Some(serde_json::json!({})),
        )
        .await
    }

    async fn get_iam_policy(&self) -> Result<IamPolicy, GatewayError> {
        self.call(
            "get_iam_policy",
            Method::POST,
            paths::url(
                &self.endpoints.resource_manager,
                &paths::project_get_iam_policy(&self.project_id),
            ),
            Some(serde_json::json!({})),
        )
        .await
    }

    async fn set_iam_policy(&self, policy: &IamPolicy) -> Result<IamPolicy, GatewayError> {
        let request = SetIamPolicyRequest { policy };
        self.call(
            "set_iam_policy",
            Method::POST,
            paths::url(
                &self.endpoints.resource_manager,
                &paths::project_set_iam_policy(&self.project_id),
            ),
            Some(Self::to_body("set_iam_policy", &request)?),
        )
        .await
    }

    async fn enable_billing_api(&self, project_id: &str) -> Result<(), GatewayError> {
        self.enable_service(CLOUD_BILLING_SERVICE, project_id).await
    }

    async fn enable_dns_api(&self, project_id: &str) -> Result<(), GatewayError> {
        self.enable_service(DNS_SERVICE, project_id).await
    }

    async fn create_cloud_billing_account(
        &self,
        project_id: &str,
        billing_account_id: &str,
    ) -> Result<(), GatewayError> {
        let request = ProjectBillingInfo {
            billing_account_name: format!("billingAccounts/{billing_account_id}"),
            billing_enabled: true,
        };
        let _: Empty = self
            .call(
                "update_billing_info",
                Method::PUT,
                paths::url(
                    &self.endpoints.cloud_billing,
                    &paths::billing_info(project_id),
                ),
                Some(Self::to_body("update_billing_info", &request)?),
            )
            .await?;
        Ok(())
    }
}

/// Builds [`GcpGateway`]s sharing one HTTP client
#[derive(Debug, Clone)]
pub struct GcpGatewayFactory {
    http_client: Client,
    endpoints: GcpEndpoints,
}

impl GcpGatewayFactory {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(endpoints: GcpEndpoints, timeout: Duration) -> Result<Self, GatewayError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoints,
        })
    }
}

#[async_trait]
impl GatewayFactory for GcpGatewayFactory {
    async fn build(
        &self,
        project_id: &str,
        credentials: &CloudCredentials,
    ) -> Result<Arc<dyn CloudGateway>, GatewayError> {
        let gateway = GcpGateway::connect(
            self.http_client.clone(),
            self.endpoints.clone(),
            project_id,
            credentials,
        )
        .await?;
        Ok(Arc::new(gateway))
    }
}
