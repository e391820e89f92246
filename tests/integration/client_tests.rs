//! HTTP client behavior against a mock catalog

use exam_harvest::remote::{build_http_client, CatalogApi, Endpoint, Envelope, HttpCatalogClient, RetryPolicy};
use exam_harvest::ApiError;
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_url: &str, retry: RetryPolicy) -> HttpCatalogClient {
    HttpCatalogClient::new(
        build_http_client(Duration::from_secs(2)).unwrap(),
        Url::parse(base_url).unwrap(),
        "test-key",
        retry,
    )
}

#[tokio::test]
async fn test_metadata_call_sends_selector_credential_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/questions"))
        .and(query_param("get", "exam_year_id"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"exam": "JAMB"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"exam_years": ["2023", "2022"]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&format!("{}/api/questions", mock_server.uri()), RetryPolicy::default());
    let response = client
        .call(Endpoint::Years, &json!({"exam": "JAMB"}))
        .await
        .unwrap();

    let envelope = Envelope::from_response(Endpoint::Years, &response);
    assert_eq!(envelope.items, vec![json!("2023"), json!("2022")]);
}

#[tokio::test]
async fn test_non_json_body_is_wrapped_not_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Service warming up"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri(), RetryPolicy::default());
    let response = client.call(Endpoint::Questions, &json!({})).await.unwrap();

    assert!(response.is_raw_text());
    assert_eq!(response.body, json!({"rawText": "Service warming up"}));
}

#[tokio::test]
async fn test_empty_body_parses_as_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri(), RetryPolicy::default());
    let response = client.call(Endpoint::Exams, &json!({})).await.unwrap();

    assert!(response.body.is_null());
}

#[tokio::test]
async fn test_error_status_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri(), RetryPolicy::new(4, Duration::ZERO));
    let err = client.call(Endpoint::Questions, &json!({})).await.unwrap_err();

    match err {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected a status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_not_found_status_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Subject not found"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri(), RetryPolicy::default());
    let err = client.call(Endpoint::Questions, &json!({})).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_a_network_error() {
    // Bind and drop a listener to get a port nothing is serving on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = client_for(
        &format!("http://127.0.0.1:{}/api/questions", port),
        RetryPolicy::new(2, Duration::ZERO),
    );
    let err = client.call(Endpoint::Exams, &json!({})).await.unwrap_err();

    assert!(matches!(err, ApiError::Network { .. }));
    assert!(err.is_transient());
}
