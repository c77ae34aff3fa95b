use crate::client::{ClientConfig, Credentials, Surface};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::time::Duration;

/// Connection settings shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_base_url: String,
    pub timeout: Duration,
    pub refresh_timeout: Option<Duration>,
    pub login_path: String,
    pub surface: Surface,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_base_url: String) -> Self {
        Self {
            api_base_url,
            timeout: crate::client::config::DEFAULT_TIMEOUT,
            refresh_timeout: None,
            login_path: crate::client::config::DEFAULT_LOGIN_PATH.to_string(),
            surface: Surface::default(),
            username: None,
            password: None,
        }
    }

    pub fn set_credentials(&mut self, username: String, password: SecretString) {
        self.username = Some(username);
        self.password = Some(password);
    }

    /// # Errors
    /// Returns an error if the API base URL is not a valid http(s) URL.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let config = ClientConfig::new(&self.api_base_url)
            .context("invalid ESCROW_API_BASE_URL")?
            .with_timeout(self.timeout)
            .with_login_path(&self.login_path)
            .with_surface(self.surface);

        Ok(match self.refresh_timeout {
            Some(refresh_timeout) => config.with_refresh_timeout(refresh_timeout),
            None => config,
        })
    }

    /// Login credentials, when both halves were supplied.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new("https://api.escrow.tld".to_string());
        assert_eq!(args.api_base_url, "https://api.escrow.tld");
        assert_eq!(args.login_path, "/login");
        assert!(args.credentials().is_none());
    }

    #[test]
    fn test_credentials() {
        let mut args = GlobalArgs::new("https://api.escrow.tld".to_string());
        args.set_credentials("alice".to_string(), SecretString::from("pw".to_string()));
        let credentials = args.credentials();
        assert_eq!(
            credentials.as_ref().map(|c| c.username.as_str()),
            Some("alice")
        );
        assert_eq!(
            credentials.as_ref().map(|c| c.password.expose_secret()),
            Some("pw")
        );
    }

    #[test]
    fn test_client_config() -> Result<()> {
        let mut args = GlobalArgs::new("http://localhost:8080/api".to_string());
        args.timeout = Duration::from_secs(3);
        args.surface = Surface::Public;
        let config = args.client_config()?;
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(3));
        assert_eq!(config.surface(), Surface::Public);

        args.refresh_timeout = Some(Duration::from_secs(1));
        assert_eq!(
            args.client_config()?.refresh_timeout(),
            Duration::from_secs(1)
        );
        Ok(())
    }

    #[test]
    fn test_invalid_url() {
        let args = GlobalArgs::new("ftp://example.com".to_string());
        assert!(args.client_config().is_err());
    }
}
