//! Client library for the PDFMill HTML-to-PDF rendering API.
//!
//! This crate provides:
//! - OAuth2 client-credentials token acquisition with expiry-aware caching
//! - A rendering client with bounded retry on 401 and 500 responses
//! - Single-document rendering and multi-document merging
//! - A validated multi-tenant credentials registry
//! - Factories for self-contained and shared-cache deployments
//!
//! Rendering calls never fail with an error: every outcome, including
//! transport and authentication problems, is reported as a typed
//! [`RenderResult`].
//!
//! ```no_run
//! use pdfmill_client::{ClientCredentials, StandaloneClientFactory};
//!
//! # async fn run() -> Result<(), pdfmill_client::PdfClientError> {
//! let factory = StandaloneClientFactory::new();
//! factory.register(ClientCredentials::new("my-key", "my-secret"))?;
//!
//! let client = factory.client(None)?;
//! let result = client.render_from_html("<h1>Invoice</h1>", None).await;
//! if let Some(pdf) = result.data() {
//!     println!("rendered {} bytes", pdf.len());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod http;
pub mod middleware;
pub mod options;
pub mod registry;
pub mod result;
pub mod settings;
pub mod token;

pub use auth::{Authenticate, AuthenticationService, EmbeddedAuthenticator, SharedAuthenticator, TokenCache};
pub use client::RenderClient;
pub use credentials::{ClientCredentials, Environment, PRODUCTION_BASE_URL, STAGING_BASE_URL};
pub use error::{ClientResult, PdfClientError};
pub use factory::{ClientState, SharedClientFactory, StandaloneClientFactory};
pub use http::{HttpConfig, build_http_client};
pub use options::{RenderOptions, RenderRequest};
pub use registry::{CredentialsRegistry, RegistryBuilder};
pub use result::{RenderFailure, RenderResult};
pub use settings::{ClientSettings, SETTINGS_SECTION};
pub use token::AccessToken;
