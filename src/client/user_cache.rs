//! Non-authoritative user summary kept for rendering before the profile call
//! resolves. It is never used for authorization; the server re-validates
//! every request. Contents are stored serialized, and anything that no longer
//! parses is dropped.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::{PoisonError, RwLock};
use tracing::warn;

/// Minimal user projection returned by login and profile calls.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedUser {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

// Backends differ on numeric vs string ids.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
    })
}

#[derive(Debug, Default)]
pub struct UserCache {
    raw: RwLock<Option<String>>,
}

impl UserCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, user: &CachedUser) {
        match serde_json::to_string(user) {
            Ok(raw) => self.store(Some(raw)),
            Err(err) => warn!("Failed to cache user projection: {err}"),
        }
    }

    /// Hydrate from externally stored contents, e.g. a value persisted by the
    /// embedding application. Validation happens on read.
    pub fn set_raw(&self, raw: &str) {
        self.store(Some(raw.to_string()));
    }

    /// Returns the cached user, clearing the entry if it cannot be parsed.
    #[must_use]
    pub fn get(&self) -> Option<CachedUser> {
        let raw = self
            .raw
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!("Dropping unparsable cached user: {err}");
                self.clear();
                None
            }
        }
    }

    pub fn clear(&self) {
        self.store(None);
    }

    fn store(&self, value: Option<String>) {
        *self.raw.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CachedUser {
        CachedUser {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            role: Some("buyer".to_string()),
        }
    }

    #[test]
    fn set_then_get() {
        let cache = UserCache::new();
        assert_eq!(cache.get(), None);
        cache.set(&user());
        assert_eq!(cache.get(), Some(user()));
    }

    #[test]
    fn corrupt_contents_are_cleared() {
        let cache = UserCache::new();
        cache.set_raw("{not json");
        assert_eq!(cache.get(), None);

        // The corrupt value is gone; a later valid write works normally.
        cache.set(&user());
        assert_eq!(cache.get(), Some(user()));
    }

    #[test]
    fn optional_fields_default() {
        let cache = UserCache::new();
        cache.set_raw(r#"{"id":"7","username":"bob"}"#);
        let cached = cache.get();
        assert_eq!(cached.as_ref().map(|u| u.username.as_str()), Some("bob"));
        assert_eq!(cached.and_then(|u| u.role), None);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let cache = UserCache::new();
        cache.set_raw(r#"{"id":42,"username":"carol","role":"admin"}"#);
        assert_eq!(cache.get().map(|u| u.id), Some("42".to_string()));
    }

    #[test]
    fn clear_removes_entry() {
        let cache = UserCache::new();
        cache.set(&user());
        cache.clear();
        assert_eq!(cache.get(), None);
    }
}
