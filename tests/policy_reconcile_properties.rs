//! Property tests for IAM binding reconciliation

use gcp_project_operator::config::OperatorPolicy;
use gcp_project_operator::controller::provisioning::policy::reconcile_bindings;
use gcp_project_operator::provider::Binding;
use proptest::prelude::*;

const PRINCIPAL: &str = "serviceAccount:osd-managed-admin@proj-1.iam.gserviceaccount.com";

fn role() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("roles/storage.admin".to_string()),
        Just("roles/dns.admin".to_string()),
        Just("roles/owner".to_string()),
        Just("roles/viewer".to_string()),
        "roles/[a-z]{3,8}\\.[a-z]{4,6}",
    ]
}

fn member() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(PRINCIPAL.to_string()),
        "user:[a-z]{3,8}@example\\.com",
        "group:[a-z]{3,8}@example\\.com",
    ]
}

fn bindings() -> impl Strategy<Value = Vec<Binding>> {
    prop::collection::vec(
        (role(), prop::collection::vec(member(), 0..4))
            .prop_map(|(role, members)| Binding::new(role, members)),
        0..8,
    )
}

fn required_roles() -> Vec<String> {
    OperatorPolicy::default().required_roles
}

proptest! {
    #[test]
    fn test_second_pass_changes_nothing(existing in bindings()) {
        let roles = required_roles();
        let (once, _) = reconcile_bindings(&existing, &roles, PRINCIPAL);
        let (twice, changed) = reconcile_bindings(&once, &roles, PRINCIPAL);
        prop_assert!(!changed);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_members_are_never_removed(existing in bindings()) {
        let (result, _) = reconcile_bindings(&existing, &required_roles(), PRINCIPAL);
        prop_assert!(result.len() >= existing.len());
        for (before, after) in existing.iter().zip(result.iter()) {
            prop_assert_eq!(&before.role, &after.role);
            for member in &before.members {
                prop_assert!(after.members.contains(member));
            }
        }
    }

    #[test]
    fn test_every_required_role_holds_the_principal(existing in bindings()) {
        let roles = required_roles();
        let (result, _) = reconcile_bindings(&existing, &roles, PRINCIPAL);
        for role in &roles {
            let binding = result.iter().find(|binding| &binding.role == role);
            prop_assert!(binding.is_some_and(|b| b.members.iter().any(|m| m == PRINCIPAL)));
        }
    }

    #[test]
    fn test_changed_flag_matches_difference(existing in bindings()) {
        let (result, changed) = reconcile_bindings(&existing, &required_roles(), PRINCIPAL);
        prop_assert_eq!(changed, result != existing);
    }
}
