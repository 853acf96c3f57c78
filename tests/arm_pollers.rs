//! Integration tests for the ARM client and pollers using wiremock
//!
//! These tests drive the real `ArmClient` against mocked Resource Manager
//! endpoints, checking the request shape and how each poller classifies the
//! responses it gets back.

use azurerm_pollers::azure::client::ArmClient;
use azurerm_pollers::azure::ids::{CustomDomainId, ResourceGroupId};
use azurerm_pollers::azure::resources::ListByResourceGroupOptions;
use azurerm_pollers::pollers::cdn::{
    CdnCustomDomainDeletePoller, CdnCustomDomainWaitForApprovedPoller,
};
use azurerm_pollers::pollers::resource_group::{
    ResourceGroupCreatePoller, ResourceGroupPreventDeletePoller,
};
use azurerm_pollers::pollers::{
    PollError, Poller, PollerType, PollingError, PollingStatus,
    DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW,
};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{
    bearer_token, header_exists, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RG_PATH: &str = "/subscriptions/sub/resourceGroups/rg1";
const DOMAIN_PATH: &str =
    "/subscriptions/sub/resourceGroups/rg1/providers/Microsoft.Cdn/profiles/profile1/customDomains/dom1";

fn client(server: &MockServer) -> ArmClient {
    ArmClient::new(&server.uri(), "test-token").expect("client should build")
}

fn rg_id() -> ResourceGroupId {
    ResourceGroupId::new("sub", "rg1")
}

fn domain_id() -> CustomDomainId {
    CustomDomainId::new("sub", "rg1", "profile1", "dom1")
}

fn not_found(code: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "error": {"code": code, "message": "The resource was not found."}
    }))
}

fn domain_with_state(state: Option<&str>) -> ResponseTemplate {
    let mut properties = json!({
        "hostName": "www.example.com",
        "deploymentStatus": "NotStarted",
        "provisioningState": "Succeeded"
    });
    if let Some(state) = state {
        properties["domainValidationState"] = json!(state);
    }
    ResponseTemplate::new(200).set_body_json(json!({
        "id": DOMAIN_PATH,
        "name": "dom1",
        "properties": properties
    }))
}

mod client_tests {
    use super::*;

    /// GET sends the bearer token, api-version and a client request id
    #[tokio::test]
    async fn test_get_resource_group_request_shape() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RG_PATH))
            .and(query_param("api-version", "2022-09-01"))
            .and(bearer_token("test-token"))
            .and(header_exists("x-ms-client-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": RG_PATH,
                "name": "rg1",
                "location": "westeurope",
                "properties": {"provisioningState": "Succeeded"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .resource_groups_get(&rg_id())
            .await
            .expect("request should succeed");

        let group = response.model.expect("model should decode");
        assert_eq!(group.name.as_deref(), Some("rg1"));
        assert_eq!(
            group.properties.unwrap().provisioning_state.as_deref(),
            Some("Succeeded")
        );
    }

    /// 404 keeps the raw response so callers can tell "not found" apart
    #[tokio::test]
    async fn test_404_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RG_PATH))
            .respond_with(not_found("ResourceGroupNotFound"))
            .mount(&server)
            .await;

        let err = client(&server)
            .resource_groups_get(&rg_id())
            .await
            .expect_err("request should fail");

        assert!(err.was_not_found());
        assert!(!err.is_dropped_connection());
        assert!(err.to_string().contains("ResourceGroupNotFound"));
    }

    /// Listing follows nextLink until the last page
    #[tokio::test]
    async fn test_list_follows_next_link() {
        let server = MockServer::start().await;
        let resources_path = format!("{}/resources", RG_PATH);

        Mock::given(method("GET"))
            .and(path(resources_path.as_str()))
            .and(query_param("$expand", "provisioningState"))
            .and(query_param("$top", "10"))
            .and(query_param_is_missing("$skiptoken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"id": format!("{}/providers/Microsoft.Web/sites/one", RG_PATH)}],
                "nextLink": format!(
                    "{}{}?api-version=2022-09-01&$skiptoken=page2",
                    server.uri(),
                    resources_path
                )
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(resources_path.as_str()))
            .and(query_param("$skiptoken", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"id": format!("{}/providers/Microsoft.Web/sites/two", RG_PATH)}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = ListByResourceGroupOptions {
            expand: Some("provisioningState".to_string()),
            filter: None,
            top: Some(10),
        };
        let result = client(&server)
            .resources_list_by_resource_group_complete(&rg_id(), &options)
            .await
            .expect("listing should succeed");

        assert_eq!(result.items.len(), 2);
        assert!(result.latest_http_response.unwrap().is_success());
    }

    /// Nothing listening yields a dropped connection, not a status error
    #[tokio::test]
    async fn test_closed_port_is_dropped_connection() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = ArmClient::new(&endpoint, "test-token").unwrap();

        let err = client
            .resource_groups_get(&rg_id())
            .await
            .expect_err("request should fail");

        assert!(err.is_dropped_connection());
        assert!(err.response().is_none());
        assert!(!err.was_not_found());
    }
}

mod resource_group_tests {
    use super::*;

    /// Not found, then three reads: the countdown restarts after the 404
    #[tokio::test]
    async fn test_create_poller_against_api() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RG_PATH))
            .respond_with(not_found("ResourceGroupNotFound"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(RG_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "rg1"})))
            .mount(&server)
            .await;

        let mut poller = ResourceGroupCreatePoller::new(client(&server), rg_id());

        let mut statuses = Vec::new();
        for _ in 0..4 {
            statuses.push(poller.poll().await.expect("poll should succeed").status);
        }

        assert_eq!(
            statuses,
            vec![
                PollingStatus::InProgress,
                PollingStatus::InProgress,
                PollingStatus::InProgress,
                PollingStatus::Succeeded,
            ]
        );
    }

    #[tokio::test]
    async fn test_create_poller_forbidden_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RG_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": "AuthorizationFailed", "message": "no access"}
            })))
            .mount(&server)
            .await;

        let mut poller = ResourceGroupCreatePoller::new(client(&server), rg_id());
        let err = poller.poll().await.expect_err("poll should fail");

        assert!(matches!(err, PollError::Retrieving { .. }));
        assert!(err.to_string().contains(RG_PATH));
        assert!(err.to_string().contains("AuthorizationFailed"));
    }

    /// Zero nested resources: the driver finishes on the first poll
    #[tokio::test]
    async fn test_prevent_delete_empty_group() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/resources", RG_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .mount(&server)
            .await;

        let mut poller = Poller::new(
            ResourceGroupPreventDeletePoller::new(client(&server), rg_id()),
            Duration::from_secs(10),
            DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW,
        );

        let result = poller
            .poll_until_done(&CancellationToken::new())
            .await
            .expect("empty group should pass");
        assert_eq!(result.status, PollingStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_prevent_delete_missing_group() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/resources", RG_PATH)))
            .respond_with(not_found("ResourceGroupNotFound"))
            .mount(&server)
            .await;

        let mut poller = ResourceGroupPreventDeletePoller::new(client(&server), rg_id());
        let result = poller.poll().await.expect("missing group should pass");
        assert_eq!(result.status, PollingStatus::Succeeded);
    }

    /// Nested resources stop the driver immediately with a sorted listing
    #[tokio::test]
    async fn test_prevent_delete_with_nested_resources() {
        let server = MockServer::start().await;
        let b = format!("{}/providers/Microsoft.Storage/storageAccounts/b", RG_PATH);
        let a = format!("{}/providers/Microsoft.Storage/storageAccounts/a", RG_PATH);

        Mock::given(method("GET"))
            .and(path(format!("{}/resources", RG_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {"id": b, "provisioningState": "Succeeded"},
                    {"id": a, "provisioningState": "Succeeded"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut poller = Poller::new(
            ResourceGroupPreventDeletePoller::new(client(&server), rg_id()),
            Duration::from_secs(10),
            DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW,
        );

        let err = poller
            .poll_until_done(&CancellationToken::new())
            .await
            .expect_err("nested resources should block deletion");

        let PollingError::Poll(PollError::ResourcesPresent { resource_ids, .. }) = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(resource_ids, &vec![a.clone(), b.clone()]);

        let message = err.to_string();
        assert!(message.contains(RG_PATH));
        assert!(message.find(&a).unwrap() < message.find(&b).unwrap());
    }
}

mod cdn_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_poller_waits_for_404() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOMAIN_PATH))
            .and(query_param("api-version", "2024-02-01"))
            .respond_with(domain_with_state(Some("Approved")))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(DOMAIN_PATH))
            .respond_with(not_found("NotFound"))
            .mount(&server)
            .await;

        let mut poller = CdnCustomDomainDeletePoller::new(client(&server), domain_id());
        assert_eq!(poller.poll().await.unwrap().status, PollingStatus::InProgress);
        assert_eq!(poller.poll().await.unwrap().status, PollingStatus::Succeeded);
    }

    /// No validation state yet: still in progress, polled every 30s
    #[tokio::test]
    async fn test_approval_without_state() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOMAIN_PATH))
            .respond_with(domain_with_state(None))
            .mount(&server)
            .await;

        let mut poller = CdnCustomDomainWaitForApprovedPoller::new(client(&server), domain_id());
        let result = poller.poll().await.expect("poll should succeed");

        assert_eq!(result.status, PollingStatus::InProgress);
        assert_eq!(result.poll_interval, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_approval_pending_then_approved() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOMAIN_PATH))
            .respond_with(domain_with_state(Some("Pending")))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(DOMAIN_PATH))
            .respond_with(domain_with_state(Some("Approved")))
            .mount(&server)
            .await;

        let mut poller = CdnCustomDomainWaitForApprovedPoller::new(client(&server), domain_id());
        assert_eq!(poller.poll().await.unwrap().status, PollingStatus::InProgress);
        assert_eq!(poller.poll().await.unwrap().status, PollingStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_approval_rejected_stops_driver() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DOMAIN_PATH))
            .respond_with(domain_with_state(Some("Rejected")))
            .expect(1)
            .mount(&server)
            .await;

        let mut poller = Poller::new(
            CdnCustomDomainWaitForApprovedPoller::new(client(&server), domain_id()),
            Duration::from_secs(30),
            DEFAULT_DROPPED_CONNECTIONS_TO_ALLOW,
        );

        let err = poller
            .poll_until_done(&CancellationToken::new())
            .await
            .expect_err("rejected validation should fail");

        let message = err.to_string();
        assert!(message.contains(DOMAIN_PATH));
        assert!(message.contains("\"Rejected\""));
        assert!(message.contains("Deployment Status \"NotStarted\""));
    }
}
