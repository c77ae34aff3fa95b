//! Request and response interception: header attachment before a call goes
//! out, and classification of what comes back. Call sites never see any of
//! this.

use super::{
    errors::ApiError,
    headers::{self, IDEMPOTENCY_HEADER, REQUEST_ID_HEADER, XSRF_HEADER},
    request::Attempt,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
    StatusCode,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, warn};

/// Session endpoints whose 401s are answers, not expiry signals.
pub(crate) const CSRF_PATH: &str = "/auth/csrf";
pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const REFRESH_PATH: &str = "/auth/refresh";
pub(crate) const LOGOUT_PATH: &str = "/auth/logout";
pub(crate) const PROFILE_PATH: &str = "/user/profile";

/// True when a 401 on `path` should go through session refresh.
pub(crate) fn handles_session_expiry(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    ![CSRF_PATH, LOGIN_PATH, REFRESH_PATH]
        .iter()
        .any(|session_path| path.ends_with(session_path))
}

/// Builds the outgoing header set for one attempt: caller headers, a fresh
/// trace id, the CSRF token on mutations, and the idempotency key on
/// financial mutations.
pub(crate) fn prepare_headers(
    attempt: &Attempt,
    csrf_token: Option<&SecretString>,
    request_id: &str,
) -> Result<HeaderMap, ApiError> {
    let request = &attempt.request;
    let mut outgoing = request.headers().clone();

    outgoing.insert(
        HeaderName::from_static(REQUEST_ID_HEADER),
        header_value(request_id)?,
    );

    if request.is_state_changing() {
        if let Some(token) = csrf_token {
            let mut value = header_value(token.expose_secret())?;
            value.set_sensitive(true);
            outgoing.insert(HeaderName::from_static(XSRF_HEADER), value);
        }

        if headers::is_financial_path(request.path())
            && !outgoing.contains_key(IDEMPOTENCY_HEADER)
        {
            if let Some(key) = request.idempotency_key() {
                outgoing.insert(
                    HeaderName::from_static(IDEMPOTENCY_HEADER),
                    header_value(key)?,
                );
            }
        }
    } else {
        outgoing.remove(XSRF_HEADER);
    }

    Ok(outgoing)
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|err| ApiError::Serialization(format!("Invalid header value: {err}")))
}

/// Logs non-success responses. Nothing here retries or remediates.
pub(crate) fn observe_status(status: StatusCode, headers: &HeaderMap, path: &str) {
    match status.as_u16() {
        401 => debug!(path, "unauthorized"),
        403 => warn!(path, "forbidden"),
        429 => {
            let retry_after = headers
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("unspecified");
            warn!(path, retry_after, "rate limited");
        }
        500..=599 => error!(path, status = status.as_u16(), "server error"),
        _ => debug!(path, status = status.as_u16(), "request failed"),
    }
}

/// Maps transport errors into network-class `ApiError` variants with timeout detection.
pub(crate) fn map_request_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        ApiError::Serialization(format!("Failed to build request: {err}"))
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}
