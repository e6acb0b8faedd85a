//! Pact contract tests for the Cloud Resource Manager API
//!
//! These tests define the contract between the GCP Project Operator and the
//! Cloud Resource Manager v1 API: project creation and project IAM policy.

mod common;

use common::{base_url, init_rustls};
use gcp_project_operator::provider::gcp::{GcpEndpoints, GcpGateway};
use gcp_project_operator::provider::{Binding, CloudGateway, IamPolicy};
use pact_consumer::prelude::*;
use serde_json::json;

const PRINCIPAL: &str = "serviceAccount:osd-managed-admin@proj-1.iam.gserviceaccount.com";

fn gateway(mock_url: &str) -> GcpGateway {
    GcpGateway::with_access_token(
        reqwest::Client::new(),
        GcpEndpoints::single(&base_url(mock_url)),
        "proj-1",
        "test-token",
    )
}

#[tokio::test]
async fn test_gcp_create_project_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GCP-Project-Operator", "GCP-Resource-Manager");

    pact_builder.interaction("create a project under the parent folder", "", |mut i| {
        i.given("project proj-1 does not exist");
        i.request
            .method("POST")
            .path("/v1/projects".to_string())
            .header("authorization", "Bearer test-token")
            .header("content-type", "application/json")
            .json_body(json!({
                "projectId": "proj-1",
                "name": "proj-1",
                "parent": { "type": "folder", "id": "240634451310" }
            }));
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "operations/cp.7730969938063130608",
                "done": false
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let operation = gateway(mock_server.url().as_str())
        .create_project("240634451310")
        .await
        .expect("Failed to create project");

    assert_eq!(operation.name, "operations/cp.7730969938063130608");
    assert!(!operation.done);
}

#[tokio::test]
async fn test_gcp_create_existing_project_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GCP-Project-Operator", "GCP-Resource-Manager");

    pact_builder.interaction("create a project that already exists", "", |mut i| {
        i.given("project proj-1 exists");
        i.request
            .method("POST")
            .path("/v1/projects".to_string())
            .header("authorization", "Bearer test-token")
            .header("content-type", "application/json")
            .json_body(json!({
                "projectId": "proj-1",
                "name": "proj-1",
                "parent": { "type": "folder", "id": "240634451310" }
            }));
        i.response
            .status(409)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {
                    "code": 409,
                    "message": "Requested entity already exists",
                    "status": "ALREADY_EXISTS"
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let err = gateway(mock_server.url().as_str())
        .create_project("240634451310")
        .await
        .unwrap_err();

    assert!(err.is_conflict(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_gcp_get_iam_policy_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GCP-Project-Operator", "GCP-Resource-Manager");

    pact_builder.interaction("read the project IAM policy", "", |mut i| {
        i.given("project proj-1 exists");
        i.request
            .method("POST")
            .path("/v1/projects/proj-1:getIamPolicy".to_string())
            .header("authorization", "Bearer test-token")
            .header("content-type", "application/json")
            .json_body(json!({}));
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "version": 1,
                "etag": "BwX1",
                "bindings": [
                    { "role": "roles/owner", "members": ["user:admin@example.com"] }
                ]
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let policy = gateway(mock_server.url().as_str())
        .get_iam_policy()
        .await
        .expect("Failed to read policy");

    assert_eq!(policy.etag.as_deref(), Some("BwX1"));
    assert_eq!(policy.bindings.len(), 1);
    assert_eq!(policy.bindings[0].members, vec!["user:admin@example.com"]);
}

#[tokio::test]
async fn test_gcp_set_iam_policy_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GCP-Project-Operator", "GCP-Resource-Manager");

    pact_builder.interaction("write the project IAM policy with its etag", "", |mut i| {
        i.given("project proj-1 has policy etag BwX1");
        i.request
            .method("POST")
            .path("/v1/projects/proj-1:setIamPolicy".to_string())
            .header("authorization", "Bearer test-token")
            .header("content-type", "application/json")
            .json_body(json!({
                "policy": {
                    "version": 1,
                    "etag": "BwX1",
                    "bindings": [
                        { "role": "roles/dns.admin", "members": [PRINCIPAL] }
                    ]
                }
            }));
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "version": 1,
                "etag": "BwX2",
                "bindings": [
                    { "role": "roles/dns.admin", "members": [PRINCIPAL] }
                ]
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let policy = IamPolicy {
        version: Some(1),
        etag: Some("BwX1".to_string()),
        bindings: vec![Binding::new("roles/dns.admin", vec![PRINCIPAL.to_string()])],
    };
    let written = gateway(mock_server.url().as_str())
        .set_iam_policy(&policy)
        .await
        .expect("Failed to write policy");

    assert_eq!(written.etag.as_deref(), Some("BwX2"));
}

#[tokio::test]
async fn test_gcp_set_iam_policy_stale_etag_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GCP-Project-Operator", "GCP-Resource-Manager");

    pact_builder.interaction("write the project IAM policy with a stale etag", "", |mut i| {
        i.given("project proj-1 has policy etag BwX9");
        i.request
            .method("POST")
            .path("/v1/projects/proj-1:setIamPolicy".to_string())
            .header("authorization", "Bearer test-token")
            .json_body(json!({
                "policy": {
                    "etag": "BwX1",
                    "bindings": []
                }
            }));
        i.response
            .status(409)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {
                    "code": 409,
                    "message": "There were concurrent policy changes.",
                    "status": "ABORTED"
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let policy = IamPolicy {
        version: None,
        etag: Some("BwX1".to_string()),
        bindings: Vec::new(),
    };
    let err = gateway(mock_server.url().as_str())
        .set_iam_policy(&policy)
        .await
        .unwrap_err();

    assert!(err.is_conflict(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_gcp_delete_project_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GCP-Project-Operator", "GCP-Resource-Manager");

    pact_builder.interaction("mark a project for deletion", "", |mut i| {
        i.given("project proj-1 exists");
        i.request
            .method("DELETE")
            .path("/v1/projects/proj-1".to_string())
            .header("authorization", "Bearer test-token");
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    gateway(mock_server.url().as_str())
        .delete_project()
        .await
        .expect("Failed to delete project");
}
