//! Client configuration: API endpoint, timeout policy and the redirect target
//! used when a session cannot be renewed. Values are public; do not store
//! secrets here.

use super::errors::ApiError;
use crate::APP_USER_AGENT;
use std::{fmt, str::FromStr, time::Duration};
use url::Url;

/// Default request timeout applied to every attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default login surface used after an unrecoverable auth failure.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Where the client is running. Public surfaces treat authentication as
/// optional and never redirect to login.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Surface {
    #[default]
    App,
    Public,
}

impl FromStr for Surface {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "app" | "dashboard" | "admin" => Ok(Self::App),
            "public" | "landing" | "marketing" => Ok(Self::Public),
            other => Err(format!("invalid surface: {other}")),
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App => write!(formatter, "app"),
            Self::Public => write!(formatter, "public"),
        }
    }
}

/// Configuration for [`crate::client::ApiClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_base_url: Url,
    timeout: Duration,
    refresh_timeout: Option<Duration>,
    login_path: String,
    surface: Surface,
    user_agent: String,
}

impl ClientConfig {
    /// Create a configuration for the given API base URL.
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] if the URL cannot be parsed or is not http(s).
    pub fn new(api_base_url: &str) -> Result<Self, ApiError> {
        let api_base_url = parse_base_url(api_base_url)?;
        Ok(Self {
            api_base_url,
            timeout: DEFAULT_TIMEOUT,
            refresh_timeout: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            surface: Surface::default(),
            user_agent: APP_USER_AGENT.to_string(),
        })
    }

    /// Override the per-attempt request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound how long a request waits on a shared session refresh. Defaults
    /// to the request timeout.
    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Override the login path; blank values are ignored.
    #[must_use]
    pub fn with_login_path(mut self, path: &str) -> Self {
        if let Some(path) = normalize_value(path) {
            self.login_path = if path.starts_with('/') {
                path
            } else {
                format!("/{path}")
            };
        }
        self
    }

    #[must_use]
    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }

    /// Override the User-Agent; blank values are ignored.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        if let Some(user_agent) = normalize_value(user_agent) {
            self.user_agent = user_agent;
        }
        self
    }

    #[must_use]
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout.unwrap_or(self.timeout)
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn surface(&self) -> Surface {
        self.surface
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Joins the configured base URL with a request path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        build_url_with_base(self.api_base_url.as_str(), path)
    }
}

fn parse_base_url(value: &str) -> Result<Url, ApiError> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed)
        .map_err(|err| ApiError::Config(format!("Invalid API base URL {trimmed}: {err}")))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ApiError::Config(format!(
                "Unsupported API base URL scheme: {scheme}"
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(ApiError::Config(format!(
            "API base URL must include a host: {trimmed}"
        )));
    }
    Ok(url)
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() -> Result<(), ApiError> {
        let config = ClientConfig::new("https://api.escrow.test")?;
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.refresh_timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.login_path(), "/login");
        assert_eq!(config.surface(), Surface::App);
        assert_eq!(config.user_agent(), APP_USER_AGENT);
        Ok(())
    }

    #[test]
    fn new_rejects_bad_urls() {
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ApiError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::new("ftp://api.escrow.test"),
            Err(ApiError::Config(message)) if message.contains("scheme")
        ));
    }

    #[test]
    fn endpoint_joins_slashes() -> Result<(), ApiError> {
        let config = ClientConfig::new("https://api.escrow.test/v1/")?;
        assert_eq!(
            config.endpoint("/wallet/withdraw"),
            "https://api.escrow.test/v1/wallet/withdraw"
        );
        assert_eq!(
            config.endpoint("user/profile"),
            "https://api.escrow.test/v1/user/profile"
        );
        Ok(())
    }

    #[test]
    fn overrides_ignore_blank_values() -> Result<(), ApiError> {
        let config = ClientConfig::new("https://api.escrow.test")?
            .with_login_path("   ")
            .with_user_agent("");
        assert_eq!(config.login_path(), "/login");
        assert_eq!(config.user_agent(), APP_USER_AGENT);
        Ok(())
    }

    #[test]
    fn overrides_apply_when_present() -> Result<(), ApiError> {
        let config = ClientConfig::new("https://api.escrow.test")?
            .with_login_path("auth/sign-in")
            .with_surface(Surface::Public)
            .with_timeout(Duration::from_secs(3))
            .with_refresh_timeout(Duration::from_secs(5));
        assert_eq!(config.login_path(), "/auth/sign-in");
        assert_eq!(config.surface(), Surface::Public);
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn refresh_timeout_follows_request_timeout() -> Result<(), ApiError> {
        let config = ClientConfig::new("https://api.escrow.test")?
            .with_timeout(Duration::from_secs(2));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn surface_parses_aliases() {
        assert_eq!("Landing".parse::<Surface>(), Ok(Surface::Public));
        assert_eq!("dashboard".parse::<Surface>(), Ok(Surface::App));
        assert!("kiosk".parse::<Surface>().is_err());
    }
}
