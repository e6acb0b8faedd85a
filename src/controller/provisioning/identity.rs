//! # Service Identity Manager

use super::error::ProvisionError;
use super::pipeline::Stage;
use crate::provider::{CloudGateway, ServiceAccount};
use tracing::{info, warn};

/// Look up the service account `name`, creating it when the lookup fails
///
/// Every lookup failure is treated as absence, not only not-found; a transient
/// error therefore leads to a create attempt, which fails loudly if the
/// account does exist.
///
/// # Errors
/// The provider error of the create call
pub async fn ensure_identity(
    gateway: &dyn CloudGateway,
    name: &str,
) -> Result<ServiceAccount, ProvisionError> {
    match gateway.get_service_account(name).await {
        Ok(account) => return Ok(account),
        Err(e) if e.is_not_found() => {
            info!(
                "Service account {} not found in project {}, creating it",
                name,
                gateway.project_id()
            );
        }
        Err(e) => {
            warn!(
                "Lookup of service account {} in project {} failed ({}), attempting creation",
                name,
                gateway.project_id(),
                e
            );
        }
    }

    gateway
        .create_service_account(name, name)
        .await
        .map_err(|e| {
            ProvisionError::provider(
                Stage::EnsureIdentity,
                format!("project_id={}, name={name}", gateway.project_id()),
                e,
            )
        })
}
