//! Session entry and exit: login, profile lookup and logout. These go through
//! the same pipeline as every other call, so they pick up trace ids, CSRF
//! seeding and cookie handling for free.

use super::{
    errors::ApiError,
    pipeline::{LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH},
    request::ApiRequest,
    user_cache::CachedUser,
    ApiClient,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{info, warn};

/// Username and password for `POST /auth/login`.
#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub username: String,
    #[serde(serialize_with = "expose_password")]
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: &str, password: SecretString) -> Self {
        Self {
            username: username.trim().to_string(),
            password,
        }
    }
}

fn expose_password<S: Serializer>(
    password: &SecretString,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(password.expose_secret())
}

/// Login and profile responses come either wrapped as `{"user": {...}}` or as
/// the bare user object.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: CachedUser },
    Bare(CachedUser),
}

impl From<UserEnvelope> for CachedUser {
    fn from(envelope: UserEnvelope) -> Self {
        match envelope {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user,
        }
    }
}

impl ApiClient {
    /// Authenticate and populate the cached user projection.
    ///
    /// # Errors
    /// Returns [`ApiError::Http`] for rejected credentials (a 401 here is not
    /// treated as an expired session) and [`ApiError::Parse`] if the response
    /// carries no user.
    pub async fn login(&self, credentials: &Credentials) -> Result<CachedUser, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).json(credentials)?;
        let response = self.send(request).await?;
        let user: CachedUser = response.json::<UserEnvelope>()?.into();

        self.inner.user_cache.set(&user);
        self.inner.session.mark_authenticated();
        info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    /// Fetch the current user and update the cached projection.
    ///
    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn profile(&self) -> Result<CachedUser, ApiError> {
        let response = self.get(PROFILE_PATH).await?;
        let user: CachedUser = response.json::<UserEnvelope>()?.into();
        self.inner.user_cache.set(&user);
        Ok(user)
    }

    /// End the session. Local CSRF and cached user state are cleared even if
    /// the server call fails.
    ///
    /// # Errors
    /// Returns the server call's error after local state has been cleared.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.send(ApiRequest::post(LOGOUT_PATH)).await;

        self.inner.csrf.clear();
        self.inner.user_cache.clear();

        match result {
            Ok(_) => {
                info!("logged out");
                Ok(())
            }
            Err(err) => {
                warn!("Logout request failed: {err}");
                Err(err)
            }
        }
    }

    /// The non-authoritative user summary, if one is cached and parses.
    #[must_use]
    pub fn cached_user(&self) -> Option<CachedUser> {
        self.inner.user_cache.get()
    }

    /// Hydrate the cached user from contents persisted by the embedding
    /// application. Unparsable contents are dropped on the next read.
    pub fn restore_cached_user(&self, raw: &str) {
        self.inner.user_cache.set_raw(raw);
    }
}
