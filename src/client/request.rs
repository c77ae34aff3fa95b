//! Request and response values passed through the pipeline.

use super::{errors::ApiError, headers};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// A call built by application code, unaware of CSRF, idempotency or refresh.
///
/// Financial mutations get their idempotency key when the request is built, so
/// cloning and resending the same value reuses the key while building a new
/// request produces a new one.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    headers: HeaderMap,
    idempotency_key: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        let path = path.trim().to_string();
        let idempotency_key =
            headers::needs_idempotency_key(&method, &path).then(headers::new_idempotency_key);
        Self {
            method,
            path,
            body: None,
            headers: HeaderMap::new(),
            idempotency_key,
        }
    }

    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    /// Returns [`ApiError::Serialization`] if the body cannot be encoded.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|err| ApiError::Serialization(format!("Failed to encode request: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Attach a caller header. A caller-supplied idempotency key replaces the
    /// generated one.
    ///
    /// # Errors
    /// Returns [`ApiError::Serialization`] if the name or value is not a valid header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, ApiError> {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|err| ApiError::Serialization(format!("Invalid header name: {err}")))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|err| ApiError::Serialization(format!("Invalid header value: {err}")))?;
        if name.as_str() == headers::IDEMPOTENCY_HEADER {
            self.idempotency_key = None;
        }
        self.headers.insert(name, value);
        Ok(self)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Key attached to the request: the caller's header if supplied, else the
    /// generated one.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.headers
            .get(headers::IDEMPOTENCY_HEADER)
            .and_then(|value| value.to_str().ok())
            .or(self.idempotency_key.as_deref())
    }

    #[must_use]
    pub fn is_state_changing(&self) -> bool {
        headers::is_state_changing(&self.method)
    }
}

/// Retry marker carried by each attempt. A request is retried at most once
/// after a session refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    Initial,
    Retried,
}

/// An [`ApiRequest`] together with its retry marker.
#[derive(Clone, Debug)]
pub struct Attempt {
    pub request: ApiRequest,
    pub retry: RetryState,
}

impl Attempt {
    #[must_use]
    pub fn first(request: ApiRequest) -> Self {
        Self {
            request,
            retry: RetryState::Initial,
        }
    }

    /// The single retry allowed after a refresh, or `None` if it was used.
    #[must_use]
    pub fn retried(self) -> Option<Self> {
        match self.retry {
            RetryState::Initial => Some(Self {
                request: self.request,
                retry: RetryState::Retried,
            }),
            RetryState::Retried => None,
        }
    }

    #[must_use]
    pub fn number(&self) -> u8 {
        match self.retry {
            RetryState::Initial => 1,
            RetryState::Retried => 2,
        }
    }
}

/// A successful (2xx) response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status == StatusCode::NO_CONTENT || self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    /// Returns [`ApiError::Parse`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    }
}

/// Sanitizes HTTP error bodies for user-facing messages by trimming and truncating.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn financial_mutation_gets_key_at_build_time() {
        let request = ApiRequest::post("/wallet/withdraw");
        let key = request.idempotency_key().map(ToString::to_string);
        assert!(key.is_some());

        let resent = request.clone();
        assert_eq!(resent.idempotency_key().map(ToString::to_string), key);

        let separate = ApiRequest::post("/wallet/withdraw");
        assert_ne!(separate.idempotency_key().map(ToString::to_string), key);
    }

    #[test]
    fn reads_and_other_paths_get_no_key() {
        assert_eq!(ApiRequest::get("/transactions").idempotency_key(), None);
        assert_eq!(ApiRequest::post("/user/profile").idempotency_key(), None);
    }

    #[test]
    fn caller_key_wins() -> Result<(), ApiError> {
        let request = ApiRequest::post("/topup").header("X-Idempotency-Key", "caller-key")?;
        assert_eq!(request.idempotency_key(), Some("caller-key"));
        Ok(())
    }

    #[test]
    fn header_rejects_invalid_names() {
        assert!(matches!(
            ApiRequest::get("/user/profile").header("bad header", "x"),
            Err(ApiError::Serialization(_))
        ));
    }

    #[test]
    fn json_body_is_encoded() -> Result<(), ApiError> {
        let request = ApiRequest::put("/escrows/1").json(&json!({"amount": 10}))?;
        assert_eq!(request.body(), Some(&json!({"amount": 10})));
        assert!(request.is_state_changing());
        Ok(())
    }

    #[test]
    fn attempt_allows_exactly_one_retry() {
        let attempt = Attempt::first(ApiRequest::get("/transactions"));
        assert_eq!(attempt.number(), 1);

        let retried = attempt.retried();
        assert_eq!(retried.as_ref().map(|a| a.retry), Some(RetryState::Retried));
        assert_eq!(retried.as_ref().map(Attempt::number), Some(2));
        assert!(retried.and_then(Attempt::retried).is_none());
    }

    #[test]
    fn retry_keeps_idempotency_key() {
        let attempt = Attempt::first(ApiRequest::delete("/wallet/cards/3"));
        let key = attempt.request.idempotency_key().map(ToString::to_string);
        let retried = attempt.retried();
        assert_eq!(
            retried.and_then(|a| a.request.idempotency_key().map(ToString::to_string)),
            key
        );
    }

    #[test]
    fn response_json_and_empty_detection() -> Result<(), ApiError> {
        #[derive(Deserialize)]
        struct Balance {
            amount: u64,
        }

        let response = ApiResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            br#"{"amount": 42}"#.to_vec(),
        );
        assert_eq!(response.json::<Balance>()?.amount, 42);
        assert!(!response.is_empty());

        let empty = ApiResponse::new(StatusCode::NO_CONTENT, HeaderMap::new(), Vec::new());
        assert!(empty.is_empty());
        assert!(matches!(empty.json::<Balance>(), Err(ApiError::Parse(_))));
        Ok(())
    }

    #[test]
    fn sanitize_body_trims_and_truncates() {
        assert_eq!(sanitize_body("   "), "Request failed.");
        assert_eq!(sanitize_body("  denied \n"), "denied");
        assert_eq!(sanitize_body(&"x".repeat(500)).len(), MAX_ERROR_CHARS);
    }
}
