//! # Policy Reconciler
//!
//! Grants the service account every required role with the smallest possible
//! change to the project IAM policy. Members are only ever added.

use super::error::ProvisionError;
use super::pipeline::Stage;
use crate::observability::metrics;
use crate::provider::{Binding, CloudGateway};
use tracing::{debug, info};

/// Ensure `principal` is a member of each role in `required_roles`
///
/// Returns the new binding list and whether it differs from `bindings`.
/// Bindings for other roles pass through untouched. When several bindings
/// share a role only the first one is updated.
#[must_use]
pub fn reconcile_bindings(
    bindings: &[Binding],
    required_roles: &[String],
    principal: &str,
) -> (Vec<Binding>, bool) {
    let mut result = bindings.to_vec();
    let mut changed = false;

    for role in required_roles {
        match result.iter_mut().find(|binding| &binding.role == role) {
            Some(binding) => {
                if !binding.members.iter().any(|member| member == principal) {
                    binding.members.push(principal.to_string());
                    changed = true;
                }
            }
            None => {
                result.push(Binding::new(role.clone(), vec![principal.to_string()]));
                changed = true;
            }
        }
    }

    (result, changed)
}

/// Read the project policy, reconcile it and write it back if it changed
///
/// The etag read is sent back with the write so a concurrent edit makes the
/// write fail rather than being overwritten.
///
/// # Errors
/// The provider error of the get or set call
pub async fn apply_policy(
    gateway: &dyn CloudGateway,
    required_roles: &[String],
    principal: &str,
) -> Result<bool, ProvisionError> {
    let operands = || format!("project_id={}, principal={principal}", gateway.project_id());

    let mut policy = gateway
        .get_iam_policy()
        .await
        .map_err(|e| ProvisionError::provider(Stage::ReconcilePolicy, operands(), e))?;

    let (bindings, changed) = reconcile_bindings(&policy.bindings, required_roles, principal);
    if !changed {
        debug!(
            "IAM policy of project {} already grants {} all required roles",
            gateway.project_id(),
            principal
        );
        return Ok(false);
    }

    policy.bindings = bindings;
    gateway
        .set_iam_policy(&policy)
        .await
        .map_err(|e| ProvisionError::provider(Stage::ReconcilePolicy, operands(), e))?;
    metrics::increment_iam_policy_writes();

    info!(
        "Updated IAM policy of project {} for {}",
        gateway.project_id(),
        principal
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::IamPolicy;
    use crate::testing::FakeGateway;

    const PRINCIPAL: &str = "serviceAccount:osd-managed-admin@proj-1.iam.gserviceaccount.com";

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_adds_missing_binding_and_member() {
        let existing = vec![Binding::new(
            "roles/storage.admin",
            vec!["user:ops@example.com".to_string()],
        )];
        let (bindings, changed) = reconcile_bindings(
            &existing,
            &roles(&["roles/storage.admin", "roles/dns.admin"]),
            PRINCIPAL,
        );

        assert!(changed);
        assert_eq!(
            bindings[0].members,
            vec!["user:ops@example.com".to_string(), PRINCIPAL.to_string()]
        );
        assert_eq!(bindings[1].role, "roles/dns.admin");
        assert_eq!(bindings[1].members, vec![PRINCIPAL.to_string()]);
    }

    #[test]
    fn test_converged_policy_is_unchanged() {
        let existing = vec![Binding::new("roles/dns.admin", vec![PRINCIPAL.to_string()])];
        let (bindings, changed) =
            reconcile_bindings(&existing, &roles(&["roles/dns.admin"]), PRINCIPAL);
        assert!(!changed);
        assert_eq!(bindings, existing);
    }

    #[test]
    fn test_only_first_duplicate_is_updated() {
        let existing = vec![
            Binding::new("roles/dns.admin", vec![]),
            Binding::new("roles/dns.admin", vec![]),
        ];
        let (bindings, changed) =
            reconcile_bindings(&existing, &roles(&["roles/dns.admin"]), PRINCIPAL);
        assert!(changed);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].members, vec![PRINCIPAL.to_string()]);
        assert!(bindings[1].members.is_empty());
    }

    #[tokio::test]
    async fn test_apply_writes_once_and_keeps_etag() {
        let gateway = FakeGateway::new("proj-1");
        gateway.set_policy(IamPolicy {
            version: Some(1),
            etag: Some("BwWWja0YfJA=".to_string()),
            bindings: vec![],
        });
        let required = roles(&["roles/dns.admin", "roles/iam.securityAdmin"]);

        assert!(apply_policy(&gateway, &required, PRINCIPAL).await.unwrap());
        assert!(!apply_policy(&gateway, &required, PRINCIPAL).await.unwrap());

        let writes: Vec<_> = gateway
            .calls()
            .into_iter()
            .filter(|call| call == "set_iam_policy")
            .collect();
        assert_eq!(writes.len(), 1);
        assert_eq!(gateway.last_written_etag().as_deref(), Some("BwWWja0YfJA="));
    }
}
