//! # Project Provisioner

use super::error::ProvisionError;
use super::pipeline::Stage;
use crate::provider::CloudGateway;
use tracing::{debug, info};

/// Create the gateway's project under `parent_folder_id`
///
/// An "already exists" answer counts as success. The returned operation is
/// not awaited; the next stages fail (and the pass is retried) until the
/// project is usable.
///
/// # Errors
/// Any provider error other than a conflict
pub async fn ensure_project(
    gateway: &dyn CloudGateway,
    parent_folder_id: &str,
) -> Result<(), ProvisionError> {
    match gateway.create_project(parent_folder_id).await {
        Ok(operation) => {
            info!(
                "Requested creation of project {} under folder {}",
                gateway.project_id(),
                parent_folder_id
            );
            debug!("Project operation: {} (done: {})", operation.name, operation.done);
            Ok(())
        }
        Err(e) if e.is_conflict() => {
            debug!("Project {} already exists", gateway.project_id());
            Ok(())
        }
        Err(e) => Err(ProvisionError::provider(
            Stage::EnsureProject,
            format!(
                "project_id={}, parent_folder_id={}",
                gateway.project_id(),
                parent_folder_id
            ),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGateway;

    #[tokio::test]
    async fn test_creates_missing_project() {
        let gateway = FakeGateway::new("proj-1");
        ensure_project(&gateway, "240634451310").await.unwrap();
        assert!(gateway.project_exists());
    }

    #[tokio::test]
    async fn test_conflict_is_success() {
        let gateway = FakeGateway::new("proj-1");
        gateway.set_project_exists(true);
        assert!(ensure_project(&gateway, "240634451310").await.is_ok());
    }

    #[tokio::test]
    async fn test_other_errors_surface() {
        let gateway = FakeGateway::new("proj-1");
        gateway.fail_on("create_project");
        let err = ensure_project(&gateway, "240634451310").await.unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::ProviderCall {
                stage: Stage::EnsureProject,
                ..
            }
        ));
    }
}
