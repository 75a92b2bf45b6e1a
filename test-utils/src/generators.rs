//! Shared proptest generators for PDFMill client domain types.

use pdfmill_client::{ClientCredentials, Environment, RenderOptions, RenderRequest};
use proptest::prelude::*;

/// Generate plausible API keys.
pub fn api_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{16,32}".prop_map(|key| format!("pk-{key}"))
}

/// Generate plausible API secrets.
pub fn api_secret_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{24,48}".prop_map(|secret| format!("sk-{secret}"))
}

/// Generate optional client display names.
pub fn client_name_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z][a-z0-9-]{2,20}")
}

/// Generate environments without custom base URLs.
pub fn environment_strategy() -> impl Strategy<Value = Environment> {
    prop_oneof![Just(Environment::Production), Just(Environment::Staging)]
}

/// Generate valid client credentials.
pub fn credentials_strategy() -> impl Strategy<Value = ClientCredentials> {
    (
        api_key_strategy(),
        api_secret_strategy(),
        client_name_strategy(),
        environment_strategy(),
        any::<bool>(),
    )
        .prop_map(|(key, secret, name, environment, compression)| {
            let credentials = ClientCredentials::new(key, secret)
                .with_environment(environment)
                .with_compression(compression);
            match name {
                Some(name) => credentials.with_name(name),
                None => credentials,
            }
        })
}

/// Generate a list of credentials with unique keys and names.
pub fn unique_credentials_list_strategy(
    max_len: usize,
) -> impl Strategy<Value = Vec<ClientCredentials>> {
    proptest::collection::vec(credentials_strategy(), 1..=max_len).prop_map(|mut entries| {
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.api_key = format!("{}-{i}", entry.api_key);
            if let Some(name) = entry.name.take() {
                entry.name = Some(format!("{name}-{i}"));
            }
        }
        entries
    })
}

/// Generate rendering options within realistic bounds.
pub fn render_options_strategy() -> impl Strategy<Value = RenderOptions> {
    (0..200i32, 0..200i32, 0..200i32, 0..200i32, any::<bool>(), any::<bool>()).prop_map(
        |(left, right, top, bottom, grayscale, landscape)| {
            RenderOptions::new()
                .with_margins(left, right, top, bottom)
                .with_grayscale(grayscale)
                .with_landscape(landscape)
        },
    )
}

/// Generate small HTML documents.
pub fn html_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{1,64}".prop_map(|text| format!("<html><body><p>{text}</p></body></html>"))
}

/// Generate rendering requests.
pub fn render_request_strategy() -> impl Strategy<Value = RenderRequest> {
    (html_strategy(), render_options_strategy())
        .prop_map(|(html, options)| RenderRequest::new(html).with_options(options))
}
