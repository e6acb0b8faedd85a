//! # API and Billing Activation

use super::error::ProvisionError;
use super::pipeline::Stage;
use crate::provider::CloudGateway;
use tracing::info;

/// Enable the billing API, link the billing account, then enable DNS
///
/// The first failing call aborts the rest. All three calls are accepted by
/// the provider when the target state is already in place.
///
/// # Errors
/// The first provider error encountered
pub async fn activate(
    gateway: &dyn CloudGateway,
    project_id: &str,
    billing_account_id: &str,
) -> Result<(), ProvisionError> {
    gateway
        .enable_billing_api(project_id)
        .await
        .map_err(|e| {
            ProvisionError::provider(
                Stage::ActivateApis,
                format!("enable_billing_api project_id={project_id}"),
                e,
            )
        })?;

    gateway
        .create_cloud_billing_account(project_id, billing_account_id)
        .await
        .map_err(|e| {
            ProvisionError::provider(
                Stage::ActivateApis,
                format!(
                    "create_cloud_billing_account project_id={project_id}, billing_account_id={billing_account_id}"
                ),
                e,
            )
        })?;

    gateway.enable_dns_api(project_id).await.map_err(|e| {
        ProvisionError::provider(
            Stage::ActivateApis,
            format!("enable_dns_api project_id={project_id}"),
            e,
        )
    })?;

    info!("Billing and DNS APIs enabled for project {}", project_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGateway;

    #[tokio::test]
    async fn test_calls_in_order() {
        let gateway = FakeGateway::new("proj-1");
        activate(&gateway, "proj-1", "0000-1111").await.unwrap();
        assert_eq!(
            gateway.calls(),
            vec![
                "enable_billing_api",
                "create_cloud_billing_account",
                "enable_dns_api"
            ]
        );
        assert_eq!(gateway.linked_billing_account().as_deref(), Some("0000-1111"));
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_calls() {
        let gateway = FakeGateway::new("proj-1");
        gateway.fail_on("create_cloud_billing_account");

        let err = activate(&gateway, "proj-1", "0000-1111").await.unwrap_err();
        assert!(err.to_string().contains("create_cloud_billing_account"));
        assert!(!gateway.calls().contains(&"enable_dns_api".to_string()));
    }
}
