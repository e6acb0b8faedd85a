//! Credential rotation tests against the in-memory gateway

use gcp_project_operator::controller::provisioning::rotation::{
    delete_service_account_keys, rotate,
};
use gcp_project_operator::controller::provisioning::ProvisionError;
use gcp_project_operator::testing::FakeGateway;

const ACCOUNT: &str = "osd-managed-admin";

fn delete_calls(gateway: &FakeGateway) -> usize {
    gateway
        .calls()
        .iter()
        .filter(|call| call.as_str() == "delete_service_account_key")
        .count()
}

#[tokio::test]
async fn test_single_existing_key_is_left_alone() {
    let gateway = FakeGateway::new("proj-1");
    let email = gateway.add_service_account(ACCOUNT).email;
    let existing = gateway.add_key(&email, true);

    let key = rotate(&gateway, &email).await.unwrap();

    assert_eq!(delete_calls(&gateway), 0);
    assert_eq!(gateway.key_count(&email), 2);
    assert!(gateway.key_names(&email).contains(&existing));
    assert_ne!(key.name, existing);
    assert!(!key.private_key_data.is_empty());
}

#[tokio::test]
async fn test_three_keys_are_all_deleted_before_minting() {
    let gateway = FakeGateway::new("proj-1");
    let email = gateway.add_service_account(ACCOUNT).email;
    for _ in 0..3 {
        gateway.add_key(&email, true);
    }

    let key = rotate(&gateway, &email).await.unwrap();

    assert_eq!(delete_calls(&gateway), 3);
    assert_eq!(gateway.key_names(&email), vec![key.name]);
}

#[tokio::test]
async fn test_undeletable_keys_fail_cleanup() {
    let gateway = FakeGateway::new("proj-1");
    let email = gateway.add_service_account(ACCOUNT).email;
    for _ in 0..3 {
        gateway.add_key(&email, false);
    }

    let err = delete_service_account_keys(&gateway, &email)
        .await
        .unwrap_err();

    assert_eq!(delete_calls(&gateway), 3);
    match err {
        ProvisionError::KeyCleanupIncomplete { remaining, .. } => assert_eq!(remaining, 3),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!gateway
        .calls()
        .contains(&"create_service_account_key".to_string()));
}

#[tokio::test]
async fn test_one_surviving_key_counts_as_clean() {
    let gateway = FakeGateway::new("proj-1");
    let email = gateway.add_service_account(ACCOUNT).email;
    gateway.add_key(&email, false);
    gateway.add_key(&email, true);
    gateway.add_key(&email, true);

    delete_service_account_keys(&gateway, &email).await.unwrap();

    assert_eq!(delete_calls(&gateway), 3);
    assert_eq!(gateway.key_count(&email), 1);
}
