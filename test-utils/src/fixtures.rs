//! Test fixtures with sample data.

use pdfmill_client::ClientCredentials;

/// Leading bytes of every PDF document.
pub const PDF_MAGIC: &[u8] = b"%PDF-1.7";

/// Bearer token handed out by the mock token endpoint by default.
pub const SAMPLE_BEARER_TOKEN: &str = "sample-access-token";

/// Sample credentials for a single-tenant setup.
#[must_use]
pub fn sample_credentials() -> ClientCredentials {
    ClientCredentials::new("sample-key", "sample-secret").with_name("sample")
}

/// Sample credentials for a two-tenant setup, unique keys and names.
#[must_use]
pub fn sample_credentials_pair() -> Vec<ClientCredentials> {
    vec![
        ClientCredentials::new("invoices-key", "invoices-secret").with_name("invoices"),
        ClientCredentials::new("reports-key", "reports-secret").with_name("reports"),
    ]
}

/// A fake PDF body: magic bytes followed by filler.
#[must_use]
pub fn sample_pdf_bytes() -> Vec<u8> {
    let mut bytes = PDF_MAGIC.to_vec();
    bytes.extend_from_slice(b"\n1 0 obj\n<< >>\nendobj\ntrailer\n%%EOF\n");
    bytes
}

/// A token endpoint response body.
#[must_use]
pub fn token_response_json(access_token: &str, expires_in: i64) -> String {
    serde_json::json!({
        "token_type": "Bearer",
        "access_token": access_token,
        "expires_in": expires_in,
    })
    .to_string()
}
