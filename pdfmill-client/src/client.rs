//! The rendering client.
//!
//! One client talks to one environment with one set of credentials. All
//! rendering calls return a classified [`RenderResult`] and never surface an
//! error to the caller: transport and authentication failures become
//! `other_error` outcomes carrying a diagnostic JSON message.

use crate::auth::Authenticate;
use crate::credentials::ClientCredentials;
use crate::error::{ClientResult, PdfClientError};
use crate::middleware::SendPipeline;
use crate::options::{RenderOptions, RenderRequest};
use crate::result::RenderResult;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

/// PDF creation endpoint path, relative to the base URL.
pub const CREATE_PDF_PATH: &str = "pdf/create";

/// PDF merge endpoint path, relative to the base URL.
pub const MERGE_PDF_PATH: &str = "pdf/merge";

/// Client for the PDF rendering API.
///
/// Cheap to clone is not a goal; wrap it in an [`Arc`] and share. The
/// authentication strategy is injected, so shared-cache and self-contained
/// deployments use the same client type.
pub struct RenderClient {
    name: Option<String>,
    api_key: String,
    base_url: Url,
    http: reqwest::Client,
    pipeline: SendPipeline,
    requests_served: AtomicU64,
}

impl RenderClient {
    /// Create a client over the given credentials, transport, and
    /// authentication strategy.
    ///
    /// # Errors
    ///
    /// Fails with [`PdfClientError::Configuration`] when the credentials
    /// cannot resolve a base URL.
    pub fn new(
        credentials: &ClientCredentials,
        http: reqwest::Client,
        auth: Arc<dyn Authenticate>,
    ) -> ClientResult<Self> {
        let base_url = credentials.resolved_base_url()?;
        Ok(Self {
            name: credentials.name.clone(),
            api_key: credentials.api_key.clone(),
            base_url,
            http,
            pipeline: SendPipeline::new(auth),
            requests_served: AtomicU64::new(0),
        })
    }

    /// The optional display name from the credentials.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The API key this client authenticates as.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Number of rendering calls this instance has completed.
    #[must_use]
    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    /// Render a single HTML document to PDF.
    #[instrument(skip(self, html), fields(api_key = %self.api_key))]
    pub async fn render_from_html(
        &self,
        html: &str,
        options: Option<&RenderOptions>,
    ) -> RenderResult<Vec<u8>> {
        let defaults = RenderOptions::default();
        let options = options.unwrap_or(&defaults);
        self.execute(|| self.build_create(html, options)).await
    }

    /// Render a single request to PDF.
    pub async fn render_request(&self, request: &RenderRequest) -> RenderResult<Vec<u8>> {
        self.render_from_html(&request.html, Some(&request.options))
            .await
    }

    /// Render several documents and merge them into one PDF, in order.
    #[instrument(skip(self, requests), fields(api_key = %self.api_key, count = requests.len()))]
    pub async fn render_merged(&self, requests: &[RenderRequest]) -> RenderResult<Vec<u8>> {
        if requests.is_empty() {
            return RenderResult::other_error(error_json(&PdfClientError::configuration(
                "merge requires at least one document",
            )));
        }
        self.execute(|| self.build_merge(requests)).await
    }

    /// Like [`RenderClient::render_from_html`], abandoning the call when the
    /// token is cancelled.
    pub async fn render_from_html_with_cancel(
        &self,
        html: &str,
        options: Option<&RenderOptions>,
        cancel: &CancellationToken,
    ) -> RenderResult<Vec<u8>> {
        tokio::select! {
            () = cancel.cancelled() => Self::cancelled_result(),
            result = self.render_from_html(html, options) => result,
        }
    }

    /// Like [`RenderClient::render_merged`], abandoning the call when the
    /// token is cancelled.
    pub async fn render_merged_with_cancel(
        &self,
        requests: &[RenderRequest],
        cancel: &CancellationToken,
    ) -> RenderResult<Vec<u8>> {
        tokio::select! {
            () = cancel.cancelled() => Self::cancelled_result(),
            result = self.render_merged(requests) => result,
        }
    }

    fn cancelled_result() -> RenderResult<Vec<u8>> {
        debug!("rendering call cancelled");
        RenderResult::other_error(error_json(&PdfClientError::Cancelled))
    }

    /// Run one logical call through the pipeline and classify the outcome.
    /// Every failure path collapses into a [`RenderResult`]; nothing panics
    /// and no error escapes.
    async fn execute<F>(&self, build: F) -> RenderResult<Vec<u8>>
    where
        F: Fn() -> ClientResult<RequestBuilder> + Send + Sync,
    {
        let result = match self.pipeline.execute(&build).await {
            Ok(response) => self.classify(response).await,
            Err(e) => {
                warn!(api_key = %self.api_key, error = %e, "rendering call failed");
                RenderResult::other_error(error_json(&e))
            }
        };

        self.requests_served.fetch_add(1, Ordering::Relaxed);
        result
    }

    async fn classify(&self, response: Response) -> RenderResult<Vec<u8>> {
        let status = response.status();

        if status.is_success() {
            return match response.bytes().await {
                Ok(bytes) => RenderResult::success(bytes.to_vec()),
                Err(e) => RenderResult::other_error(error_json(&PdfClientError::Http(e))),
            };
        }

        if status == StatusCode::PAYMENT_REQUIRED {
            warn!(api_key = %self.api_key, "out of credits");
            return RenderResult::out_of_credits(&self.api_key);
        }

        warn!(api_key = %self.api_key, %status, "rendering call rejected");
        // The raw body is passed through untouched so callers see the
        // server's own diagnostics.
        let body = response.text().await.unwrap_or_default();
        RenderResult::other_error(body)
    }

    fn build_create(&self, html: &str, options: &RenderOptions) -> ClientResult<RequestBuilder> {
        let url = self.base_url.join(CREATE_PDF_PATH)?;
        Ok(self
            .http
            .post(url)
            .query(&options.to_query())
            .header(reqwest::header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(html.to_owned()))
    }

    fn build_merge(&self, requests: &[RenderRequest]) -> ClientResult<RequestBuilder> {
        let url = self.base_url.join(MERGE_PDF_PATH)?;

        let mut form = Form::new();
        for (i, request) in requests.iter().enumerate() {
            let body = Part::text(request.html.clone()).mime_str("text/html; charset=utf-8")?;
            let o = &request.options;
            form = form
                .part(format!("d[{i}].body"), body)
                .text(format!("d[{i}].landscape"), o.landscape.to_string())
                .text(format!("d[{i}].grayscale"), o.grayscale.to_string())
                .text(format!("d[{i}].marginleft"), o.margin_left.to_string())
                .text(format!("d[{i}].marginright"), o.margin_right.to_string())
                .text(format!("d[{i}].margintop"), o.margin_top.to_string())
                .text(format!("d[{i}].marginbottom"), o.margin_bottom.to_string());
        }

        Ok(self.http.post(url).multipart(form))
    }
}

impl std::fmt::Debug for RenderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderClient")
            .field("name", &self.name)
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Serialize an error into the diagnostic JSON used for `other_error`
/// outcomes: the error kind, its message, and the source chain.
fn error_json(error: &PdfClientError) -> String {
    let mut sources = Vec::new();
    let mut current = std::error::Error::source(error);
    while let Some(cause) = current {
        sources.push(cause.to_string());
        current = cause.source();
    }

    json!({
        "exception": error.kind(),
        "message": error.to_string(),
        "source": sources.join(": "),
    })
    .to_string()
}
