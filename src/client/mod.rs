//! HTTP client for the escrow API.
//!
//! Call sites issue plain `get/post/put/patch/delete` calls by path. The
//! client makes every call carry a trace id, the anti-CSRF token on
//! mutations, and an idempotency key on financial mutations. A 401 triggers a
//! single shared session refresh followed by one retry; if that fails, local
//! session state is cleared and the navigator is sent to the login surface.
//!
//! The session cookie lives in the HTTP client's cookie jar. Nothing in this
//! module reads it, stores it elsewhere, or logs it.

mod auth;
pub mod config;
pub mod csrf;
pub mod errors;
pub mod headers;
pub mod navigator;
mod pipeline;
pub mod request;
mod session;
pub mod single_flight;
pub mod user_cache;

pub use auth::Credentials;
pub use config::{ClientConfig, Surface};
pub use errors::ApiError;
pub use navigator::{MemoryNavigator, Navigator};
pub use request::{ApiRequest, ApiResponse, Attempt, RetryState};
pub use session::{should_redirect, RefreshState};
pub use user_cache::CachedUser;

use self::{
    csrf::CsrfStore,
    pipeline::{handles_session_expiry, map_request_error, observe_status, prepare_headers},
    request::sanitize_body,
    session::SessionCoordinator,
    single_flight::SingleFlight,
    user_cache::UserCache,
};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

const CSRF_SEED_FLIGHT: &str = "csrf-seed";

/// Escrow API client. Cheap to clone; clones share CSRF, cookie and session
/// state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    http: Client,
    csrf: Arc<CsrfStore>,
    user_cache: Arc<UserCache>,
    seed_flight: SingleFlight<()>,
    session: SessionCoordinator,
}

impl ApiClient {
    /// Build a client with its own cookie jar.
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(config.user_agent())
            .timeout(config.timeout())
            .cookie_store(true)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        let csrf = Arc::new(CsrfStore::new());
        let user_cache = Arc::new(UserCache::new());
        let session = SessionCoordinator::new(
            Arc::clone(&csrf),
            Arc::clone(&user_cache),
            navigator,
            config.surface(),
            config.login_path(),
            config.refresh_timeout(),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                http,
                csrf,
                user_cache,
                seed_flight: SingleFlight::new(),
                session,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// True once a CSRF token has been seeded or harvested.
    #[must_use]
    pub fn has_csrf_token(&self) -> bool {
        self.inner.csrf.is_present()
    }

    #[must_use]
    pub fn refresh_state(&self) -> RefreshState {
        self.inner.session.state()
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get(path)).await
    }

    /// Fetch and decode a JSON body.
    ///
    /// # Errors
    /// See [`ApiClient::send`]; also [`ApiError::Parse`] for undecodable bodies.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get(path).await?.json()
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::patch(path).json(body)?).await
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Send a request through the full pipeline.
    ///
    /// A 401 for a request sent before the latest renewal is retried without
    /// starting another refresh.
    ///
    /// # Errors
    /// - [`ApiError::Network`] / [`ApiError::Timeout`] when no response arrived.
    /// - [`ApiError::SessionExpired`] when the session could not be renewed, or
    ///   the single retry after renewal was also rejected.
    /// - [`ApiError::Http`] for every other non-2xx status, unchanged.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt = Attempt::first(request);

        loop {
            let generation = self.inner.session.generation();
            let message = match self.execute(&attempt).await {
                Err(ApiError::Http {
                    status: 401,
                    message,
                }) if handles_session_expiry(attempt.request.path()) => message,
                other => return other,
            };

            let path = attempt.request.path().to_string();
            let Some(retry) = attempt.retried() else {
                warn!(path = %path, "unauthorized after session refresh");
                self.inner.session.end_session();
                return Err(ApiError::SessionExpired(format!(
                    "Request rejected after session refresh: {message}"
                )));
            };

            if self.inner.session.generation() == generation {
                self.refresh_session().await?;
            } else {
                debug!(path = %path, "session renewed while request was in flight");
            }
            debug!(path = %path, "retrying after session refresh");
            attempt = retry;
        }
    }

    /// Runs the request stage (seeding CSRF if a mutation needs it), then
    /// dispatches.
    async fn execute(&self, attempt: &Attempt) -> Result<ApiResponse, ApiError> {
        if attempt.request.is_state_changing() && !self.inner.csrf.is_present() {
            self.seed_csrf().await;
        }
        self.dispatch(attempt).await
    }

    /// Seeds the CSRF token, sharing one `GET /auth/csrf` across concurrent
    /// callers. A failed seed is logged and the caller proceeds without a token.
    async fn seed_csrf(&self) {
        self.inner
            .seed_flight
            .run(CSRF_SEED_FLIGHT, move || async move {
                if self.inner.csrf.is_present() {
                    return;
                }
                let attempt = Attempt::first(ApiRequest::get(pipeline::CSRF_PATH));
                match self.dispatch(&attempt).await {
                    Ok(_) if self.inner.csrf.is_present() => debug!("csrf token seeded"),
                    Ok(_) => warn!("CSRF seed response did not include a token"),
                    Err(err) => warn!("Failed to seed CSRF token: {err}"),
                }
            })
            .await;
    }

    async fn refresh_session(&self) -> Result<(), ApiError> {
        self.inner
            .session
            .renew(move || async move {
                let attempt = Attempt::first(ApiRequest::post(pipeline::REFRESH_PATH));
                self.execute(&attempt).await.map(|_| ())
            })
            .await
    }

    /// Sends one attempt and classifies the response. Rotated CSRF tokens are
    /// harvested from every response, successful or not.
    async fn dispatch(&self, attempt: &Attempt) -> Result<ApiResponse, ApiError> {
        let request = &attempt.request;
        let request_id = headers::new_request_id();
        let csrf_token = self.inner.csrf.get();
        let outgoing = prepare_headers(attempt, csrf_token.as_ref(), &request_id)?;

        let url = self.inner.config.endpoint(request.path());
        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), &url)
            .headers(outgoing);
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let span = info_span!(
            "http.request",
            http.method = %request.method(),
            http.route = %request.path(),
            request_id = %request_id,
            attempt = attempt.number()
        );

        self.transmit(builder, request.path())
            .instrument(span)
            .await
    }

    async fn transmit(&self, builder: RequestBuilder, path: &str) -> Result<ApiResponse, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|err| map_request_error(&err))?;

        let status = response.status();
        let response_headers = response.headers().clone();
        self.inner.csrf.harvest(&response_headers);

        let body = response
            .bytes()
            .await
            .map_err(|err| map_request_error(&err))?;

        if status.is_success() {
            debug!(status = status.as_u16(), "request completed");
            return Ok(ApiResponse::new(status, response_headers, body.to_vec()));
        }

        observe_status(status, &response_headers, path);
        Err(ApiError::Http {
            status: status.as_u16(),
            message: sanitize_body(&String::from_utf8_lossy(&body)),
        })
    }
}
