//! Anti-CSRF token holder. The token is mirrored from the `x-csrf-token`
//! response header and resent as `x-xsrf-token` on state-changing calls. It is
//! kept apart from the session cookie jar and must never be logged.

use super::headers::CSRF_RESPONSE_HEADER;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Client-scoped CSRF token store.
#[derive(Debug, Default)]
pub struct CsrfStore {
    token: RwLock<Option<SecretString>>,
}

impl CsrfStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the held token. Blank values are ignored.
    pub fn set(&self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            return;
        }
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(SecretString::from(token.to_string()));
    }

    /// Returns a copy of the current token, if one was ever seeded.
    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_string()))
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            debug!("csrf token cleared");
        }
    }

    /// Stores a rotated token if the response carries one. Returns whether a
    /// token was harvested.
    pub fn harvest(&self, headers: &HeaderMap) -> bool {
        let Some(token) = headers
            .get(CSRF_RESPONSE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return false;
        };
        self.set(token);
        debug!("csrf token rotated");
        true
    }
}
