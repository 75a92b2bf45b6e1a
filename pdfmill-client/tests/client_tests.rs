//! Integration tests for the rendering client: classification, retries,
//! merge bodies, and cancellation.

use pdfmill_client::{
    ClientCredentials, RenderOptions, RenderRequest, StandaloneClientFactory,
};
use std::sync::Arc;
use std::time::Duration;
use test_utils::fixtures::{PDF_MAGIC, sample_pdf_bytes};
use test_utils::mocks::{
    mount_pdf_create, mount_pdf_create_failing, mount_pdf_merge, mount_token_endpoint,
    mount_token_endpoint_rejecting, mount_token_endpoint_with,
};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, api_key: &str) -> Arc<pdfmill_client::RenderClient> {
    let base_url = Url::parse(&server.uri()).unwrap();
    let factory = StandaloneClientFactory::new();
    factory
        .register(ClientCredentials::new(api_key, "secret").with_base_url(base_url))
        .unwrap();
    factory.client(None).unwrap()
}

#[tokio::test]
async fn test_render_success_returns_pdf_bytes() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    mount_pdf_create(&server).await;

    let client = client_for(&server, "key-01");
    let result = client.render_from_html("<h1>Invoice</h1>", None).await;

    assert!(result.is_success());
    let pdf = result.data().unwrap();
    assert!(pdf.starts_with(PDF_MAGIC));
    assert_eq!(client.requests_served(), 1);
}

#[tokio::test]
async fn test_render_sends_options_as_query_params() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path("/pdf/create"))
        .and(query_param("MarginLeft", "10"))
        .and(query_param("MarginRight", "20"))
        .and(query_param("MarginTop", "30"))
        .and(query_param("MarginBottom", "40"))
        .and(query_param("GrayScale", "true"))
        .and(query_param("Landscape", "false"))
        .and(body_string_contains("<h1>Invoice</h1>"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_pdf_bytes()))
        .expect(1)
        .mount(&server)
        .await;

    let options = RenderOptions::new()
        .with_margins(10, 20, 30, 40)
        .with_grayscale(true);
    let client = client_for(&server, "key-01");

    let result = client.render_from_html("<h1>Invoice</h1>", Some(&options)).await;
    assert!(result.is_success());
}

#[tokio::test]
async fn test_render_sends_identifying_user_agent() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let user_agent = format!("pdfmill-client-rs/{}", env!("CARGO_PKG_VERSION"));
    Mock::given(method("POST"))
        .and(path("/pdf/create"))
        .and(header("user-agent", user_agent.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_pdf_bytes()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "key-01");
    assert!(client.render_from_html("<p>hi</p>", None).await.is_success());
}

#[tokio::test]
async fn test_payment_required_classifies_as_out_of_credits() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    mount_pdf_create_failing(&server, 402, "").await;

    let client = client_for(&server, "key-01");
    let result = client.render_from_html("<p>hi</p>", None).await;

    assert!(result.is_out_of_credits());
    let message = result.status_message().unwrap();
    assert!(message.contains("key-01"));
    let parsed: serde_json::Value = serde_json::from_str(message).unwrap();
    assert!(parsed["message"].as_str().unwrap().starts_with("No credit left"));
}

#[tokio::test]
async fn test_server_error_is_retried_once_then_reported_raw() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path("/pdf/create"))
        .respond_with(ResponseTemplate::new(500).set_body_string("render farm down"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, "key-01");
    let result = client.render_from_html("<p>hi</p>", None).await;

    assert!(result.is_other_error());
    // The server's own body is passed through untouched.
    assert_eq!(result.status_message(), Some("render farm down"));
}

#[tokio::test]
async fn test_unauthorized_then_server_error_then_success() {
    let server = MockServer::start().await;
    mount_token_endpoint_with(&server, "tok", 3600, Some(2)).await;
    Mock::given(method("POST"))
        .and(path("/pdf/create"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/pdf/create"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/pdf/create"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_pdf_bytes()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "key-01");
    let result = client.render_from_html("<p>hi</p>", None).await;
    assert!(result.is_success());
}

#[tokio::test]
async fn test_authentication_failure_becomes_diagnostic_result() {
    let server = MockServer::start().await;
    mount_token_endpoint_rejecting(&server).await;

    let client = client_for(&server, "key-01");
    let result = client.render_from_html("<p>hi</p>", None).await;

    assert!(result.is_other_error());
    let parsed: serde_json::Value =
        serde_json::from_str(result.status_message().unwrap()).unwrap();
    assert_eq!(parsed["exception"], "Authentication");
    assert!(parsed["message"].as_str().unwrap().contains("Authentication failed"));
}

#[tokio::test]
async fn test_merge_sends_indexed_multipart_fields() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path("/pdf/merge"))
        .and(body_string_contains("name=\"d[0].body\""))
        .and(body_string_contains("name=\"d[0].landscape\""))
        .and(body_string_contains("name=\"d[1].body\""))
        .and(body_string_contains("name=\"d[1].marginleft\""))
        .and(body_string_contains("<p>first</p>"))
        .and(body_string_contains("<p>second</p>"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_pdf_bytes()))
        .expect(1)
        .mount(&server)
        .await;

    let requests = [
        RenderRequest::new("<p>first</p>")
            .with_options(RenderOptions::new().with_landscape(true)),
        RenderRequest::new("<p>second</p>")
            .with_options(RenderOptions::new().with_margins(5, 5, 5, 5)),
    ];

    let client = client_for(&server, "key-01");
    let result = client.render_merged(&requests).await;
    assert!(result.is_success());
}

#[tokio::test]
async fn test_merge_without_documents_fails_without_sending() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    mount_pdf_merge(&server).await;

    let client = client_for(&server, "key-01");
    let result = client.render_merged(&[]).await;

    assert!(result.is_other_error());
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_cancellation_reports_cancelled_outcome() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path("/pdf/create"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(sample_pdf_bytes())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, "key-01");
    let cancel = CancellationToken::new();

    let cancel_soon = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_soon.cancel();
    });

    let result = client
        .render_from_html_with_cancel("<p>hi</p>", None, &cancel)
        .await;

    assert!(result.is_other_error());
    let parsed: serde_json::Value =
        serde_json::from_str(result.status_message().unwrap()).unwrap();
    assert_eq!(parsed["exception"], "Cancelled");
}
