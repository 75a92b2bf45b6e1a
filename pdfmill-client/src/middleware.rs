//! Retry and re-authentication around each send.
//!
//! Two bounded policies compose deterministically, each retrying at most
//! once:
//!
//! 1. Unauthorized policy (outermost): on a 401 response, fetch a fresh
//!    token and run the inner policy once more with it.
//! 2. Transient policy (innermost): on a 500 response, retry the identical
//!    request once.
//!
//! Requests are rebuilt from a closure for every physical attempt, since
//! multipart bodies cannot be replayed, and the Authorization header is
//! attached immediately before each send. After both retries the response
//! is returned as-is for classification.

use crate::auth::Authenticate;
use crate::error::ClientResult;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds one physical request attempt.
pub trait BuildRequest: Fn() -> ClientResult<RequestBuilder> + Send + Sync {}

impl<F> BuildRequest for F where F: Fn() -> ClientResult<RequestBuilder> + Send + Sync {}

/// Applies the retry/re-authentication policies around a logical request.
pub struct SendPipeline {
    auth: Arc<dyn Authenticate>,
}

impl SendPipeline {
    /// Create a pipeline over the given authentication strategy.
    #[must_use]
    pub fn new(auth: Arc<dyn Authenticate>) -> Self {
        Self { auth }
    }

    /// Send a logical request through both policies.
    ///
    /// # Errors
    ///
    /// Propagates authentication errors and transport errors; HTTP error
    /// statuses are not errors here and come back as the response.
    pub async fn execute<F: BuildRequest>(&self, build: &F) -> ClientResult<Response> {
        let token = self.auth.bearer_token().await?;
        let response = self.send_with_transient_retry(build, &token).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("request unauthorized, re-authenticating and retrying once");
        let token = self.auth.refresh_token().await?;
        self.send_with_transient_retry(build, &token).await
    }

    /// Inner policy: one attempt, plus one retry on 500.
    async fn send_with_transient_retry<F: BuildRequest>(
        &self,
        build: &F,
        token: &str,
    ) -> ClientResult<Response> {
        let response = Self::send_once(build, token).await?;

        if response.status() != StatusCode::INTERNAL_SERVER_ERROR {
            return Ok(response);
        }

        debug!("server error, retrying identical request once");
        Self::send_once(build, token).await
    }

    /// One physical attempt. Header write and send form one critical
    /// section per attempt; the builder is fresh, so no cross-request
    /// header state is shared.
    async fn send_once<F: BuildRequest>(build: &F, token: &str) -> ClientResult<Response> {
        let request = build()?.bearer_auth(token);
        Ok(request.send().await?)
    }
}

impl std::fmt::Debug for SendPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendPipeline").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfClientError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Counts token requests; hands out "tok-1", "tok-2", ...
    #[derive(Default)]
    struct CountingAuth {
        issued: AtomicU32,
    }

    #[async_trait]
    impl Authenticate for CountingAuth {
        async fn bearer_token(&self) -> ClientResult<String> {
            let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("tok-{n}"))
        }

        async fn refresh_token(&self) -> ClientResult<String> {
            self.bearer_token().await
        }
    }

    struct FailingAuth;

    #[async_trait]
    impl Authenticate for FailingAuth {
        async fn bearer_token(&self) -> ClientResult<String> {
            Err(PdfClientError::authentication("no token for you"))
        }

        async fn refresh_token(&self) -> ClientResult<String> {
            self.bearer_token().await
        }
    }

    fn pipeline_with_counter() -> (SendPipeline, Arc<CountingAuth>) {
        let auth = Arc::new(CountingAuth::default());
        (SendPipeline::new(auth.clone()), auth)
    }

    #[tokio::test]
    async fn test_success_is_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pdf/create"))
            .and(header("Authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (pipeline, auth) = pipeline_with_counter();
        let http = reqwest::Client::new();
        let url = format!("{}/pdf/create", server.uri());
        let build = move || -> ClientResult<RequestBuilder> { Ok(http.post(&url)) };

        let response = pipeline.execute(&build).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(auth.issued.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_then_success_reauthenticates_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pdf/create"))
            .and(header("Authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/pdf/create"))
            .and(header("Authorization", "Bearer tok-2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (pipeline, auth) = pipeline_with_counter();
        let http = reqwest::Client::new();
        let url = format!("{}/pdf/create", server.uri());
        let build = move || -> ClientResult<RequestBuilder> { Ok(http.post(&url)) };

        let response = pipeline.execute(&build).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(auth.issued.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_returned_as_is() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pdf/create"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let (pipeline, auth) = pipeline_with_counter();
        let http = reqwest::Client::new();
        let url = format!("{}/pdf/create", server.uri());
        let build = move || -> ClientResult<RequestBuilder> { Ok(http.post(&url)) };

        let response = pipeline.execute(&build).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        // One initial token, one refresh, no third fetch.
        assert_eq!(auth.issued.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_server_error_retried_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pdf/create"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(2)
            .mount(&server)
            .await;

        let (pipeline, auth) = pipeline_with_counter();
        let http = reqwest::Client::new();
        let url = format!("{}/pdf/create", server.uri());
        let build = move || -> ClientResult<RequestBuilder> { Ok(http.post(&url)) };

        let response = pipeline.execute(&build).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(auth.issued.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_then_server_error_then_success() {
        let server = MockServer::start().await;
        // Three physical attempts: 401, then 500 with the fresh token,
        // then the transient retry succeeds.
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
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (pipeline, auth) = pipeline_with_counter();
        let http = reqwest::Client::new();
        let url = format!("{}/pdf/create", server.uri());
        let build = move || -> ClientResult<RequestBuilder> { Ok(http.post(&url)) };

        let response = pipeline.execute(&build).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // Exactly one re-authentication.
        assert_eq!(auth.issued.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authentication_failure_propagates() {
        let pipeline = SendPipeline::new(Arc::new(FailingAuth));
        let http = reqwest::Client::new();
        let build =
            move || -> ClientResult<RequestBuilder> { Ok(http.post("http://localhost:9/pdf/create")) };

        let err = pipeline.execute(&build).await.unwrap_err();
        assert!(err.is_authentication());
    }
}
