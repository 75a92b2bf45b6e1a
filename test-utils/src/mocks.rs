//! Wiremock mounting helpers for the PDFMill API surface.

use crate::fixtures::{SAMPLE_BEARER_TOKEN, sample_pdf_bytes, token_response_json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a token endpoint handing out the sample bearer token.
pub async fn mount_token_endpoint(server: &MockServer) {
    mount_token_endpoint_with(server, SAMPLE_BEARER_TOKEN, 3600, None).await;
}

/// Mount a token endpoint with an explicit token, lifetime, and expected
/// number of calls.
pub async fn mount_token_endpoint_with(
    server: &MockServer,
    access_token: &str,
    expires_in: i64,
    expected_calls: Option<u64>,
) {
    let mock = Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(token_response_json(access_token, expires_in))
                .insert_header("content-type", "application/json"),
        );

    match expected_calls {
        Some(n) => mock.expect(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

/// Mount a token endpoint that always rejects with 401.
pub async fn mount_token_endpoint_rejecting(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(server)
        .await;
}

/// Mount the PDF creation endpoint returning a sample PDF.
pub async fn mount_pdf_create(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/pdf/create"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(sample_pdf_bytes())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(server)
        .await;
}

/// Mount the PDF creation endpoint answering with the given status and body.
pub async fn mount_pdf_create_failing(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path("/pdf/create"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Mount the PDF merge endpoint returning a sample PDF.
pub async fn mount_pdf_merge(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/pdf/merge"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(sample_pdf_bytes())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(server)
        .await;
}
