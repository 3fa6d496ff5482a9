//! Contract Test: HTTP Clients
//!
//! Verifies the wire behavior of the management API clients against a fake
//! server.
//!
//! Constraints verified:
//! - Requests go to the documented paths with a bearer token
//! - Client credentials are exchanged at the identity server first
//! - Impersonation headers are sent only when set
//! - HTTP status codes map to the matching error variants
//! - Clients never retry

use ec_core::config::{Credentials, DeployEnvironment, Impersonation, ProviderConfig};
use ec_core::traits::{CertificateApi, DeployRequest, RulesEngineApi, ValidationType};
use ec_core::Error;
use ec_api::{HttpCertificateClient, HttpRulesEngineClient};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig::new(Credentials::AccessToken {
        access_token: "test-token".to_string(),
    })
    .with_api_address(server.uri())
    .with_ids_address(server.uri())
}

#[tokio::test]
async fn add_policy_posts_body_with_impersonation_headers() {
    let server = MockServer::start().await;
    let policy = r#"{"name":"p","state":"locked"}"#;

    Mock::given(method("POST"))
        .and(path("/rules-engine/v1.1/policies"))
        .and(bearer_token("test-token"))
        .and(header("Portals_AccountNumber", "ACC1"))
        .and(header("Portals_PortalTypeId", "2"))
        .and(header("Portals_UserId", "55"))
        .and(body_json(json!({"name": "p", "state": "locked"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "321", "name": "p"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRulesEngineClient::new(&token_config(&server)).unwrap();
    let impersonation = Impersonation::for_account("ACC1")
        .with_portal_type_id("2")
        .with_customer_user_id("55");

    let created = client.add_policy(policy, &impersonation).await.unwrap();
    assert_eq!(created.id, "321");
}

#[tokio::test]
async fn empty_impersonation_sends_no_portal_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rules-engine/v1.1/policies/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "7", "rules": []})))
        .mount(&server)
        .await;

    let client = HttpRulesEngineClient::new(&token_config(&server)).unwrap();
    let policy = client
        .get_policy(7, &Impersonation::default())
        .await
        .unwrap();
    assert_eq!(policy["id"], "7");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    for name in ["Portals_AccountNumber", "Portals_PortalTypeId", "Portals_UserId"] {
        assert!(requests[0].headers.get(name).is_none(), "{} was sent", name);
    }
}

#[tokio::test]
async fn deploy_request_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rules-engine/v1.1/deploy-requests"))
        .and(body_json(json!({
            "message": "Auto-submitted policy",
            "policy_id": 321,
            "environment": "staging"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "dr-9", "state": "pending"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRulesEngineClient::new(&token_config(&server)).unwrap();
    let deployed = client
        .deploy_policy(
            &DeployRequest::new(321, DeployEnvironment::Staging),
            &Impersonation::default(),
        )
        .await
        .unwrap();

    assert_eq!(deployed.id, "dr-9");
    assert_eq!(deployed.state.as_deref(), Some("pending"));
}

#[tokio::test]
async fn client_credentials_are_exchanged_for_a_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=my-client"))
        .and(body_string_contains("scope=ec.rules"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "issued", "expires_in": 300})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rules-engine/v1.1/policies/7"))
        .and(bearer_token("issued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(Credentials::ClientCredentials {
        client_id: "my-client".to_string(),
        client_secret: "my-secret".to_string(),
        scope: None,
    })
    .with_api_address(server.uri())
    .with_ids_address(server.uri());

    let client = HttpRulesEngineClient::new(&config).unwrap();
    let policy = client
        .get_policy(7, &Impersonation::default())
        .await
        .unwrap();
    assert_eq!(policy["id"], 7);
}

#[tokio::test]
async fn rejected_credentials_stop_before_the_api_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let config = ProviderConfig::new(Credentials::ClientCredentials {
        client_id: "my-client".to_string(),
        client_secret: "wrong".to_string(),
        scope: Some("custom.scope".to_string()),
    })
    .with_api_address(server.uri())
    .with_ids_address(server.uri());

    let client = HttpCertificateClient::new(&config).unwrap();
    let err = client.get_certificate(1).await.unwrap_err();
    assert!(matches!(err, Error::Authentication(_)), "{:?}", err);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(String::from_utf8_lossy(&requests[0].body).contains("scope=custom.scope"));
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let cases: [(u16, fn(&Error) -> bool); 6] = [
        (401, |e| matches!(e, Error::Authentication(_))),
        (403, |e| matches!(e, Error::Authentication(_))),
        (404, |e| matches!(e, Error::NotFound(_))),
        (429, |e| matches!(e, Error::RateLimited(_))),
        (503, |e| matches!(e, Error::Api { message, .. } if message.contains("transient"))),
        (418, |e| matches!(e, Error::Api { message, .. } if message.contains("teapot body"))),
    ];

    for (status, is_expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rules-engine/v1.1/policies/7"))
            .respond_with(ResponseTemplate::new(status).set_body_string("teapot body"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpRulesEngineClient::new(&token_config(&server)).unwrap();
        let err = client
            .get_policy(7, &Impersonation::default())
            .await
            .unwrap_err();
        assert!(is_expected(&err), "status {} gave {:?}", status, err);
    }
}

#[tokio::test]
async fn malformed_body_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rules-engine/v1.1/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = HttpRulesEngineClient::new(&token_config(&server)).unwrap();
    let err = client
        .add_policy("{}", &Impersonation::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { .. }), "{:?}", err);
}

#[tokio::test]
async fn certificate_details_and_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/pki/certificate/42"))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "validation_type": "DV",
            "workflow_error_message": null,
            "domains": [{"name": "example.com", "dcv_token": {"token": "XYZ"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/pki/certificate/42/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Processing"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpCertificateClient::new(&token_config(&server)).unwrap();

    let cert = client.get_certificate(42).await.unwrap();
    assert_eq!(cert.validation_type, ValidationType::Dv);
    assert_eq!(cert.domains[0].dcv_token.as_ref().unwrap().token, "XYZ");

    let status = client.get_certificate_status(42).await.unwrap();
    assert_eq!(status.status, "Processing");
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/pki/certificate/42/status"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpCertificateClient::new(&token_config(&server)).unwrap();
    assert!(client.get_certificate_status(42).await.is_err());
}
