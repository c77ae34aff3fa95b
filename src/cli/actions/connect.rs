use crate::cli::globals::GlobalArgs;
use crate::client::{ApiClient, MemoryNavigator, Navigator};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// A client plus the navigator it reports redirects to.
pub struct Connection {
    pub client: ApiClient,
    pub navigator: Arc<MemoryNavigator>,
}

impl Connection {
    /// Warn if the session ended and the client asked to go to login.
    pub fn report_navigation(&self) {
        if self.navigator.navigations() > 0 {
            warn!(
                location = %self.navigator.current_path(),
                "session ended, log in again"
            );
        }
    }
}

/// Build a client from the global arguments, logging in first when
/// credentials were supplied.
///
/// # Errors
/// Returns an error if the configuration is invalid or login fails.
pub async fn connect(globals: &GlobalArgs) -> Result<Connection> {
    let config = globals.client_config()?;
    let navigator = Arc::new(MemoryNavigator::default());
    let client = ApiClient::new(config, navigator.clone())?;

    if let Some(credentials) = globals.credentials() {
        let user = client
            .login(&credentials)
            .await
            .with_context(|| format!("login failed for {}", credentials.username))?;
        info!(username = %user.username, "authenticated");
    }

    Ok(Connection { client, navigator })
}

/// Print a response body, pretty-printing JSON.
pub fn print_body(body: &[u8]) {
    if body.iter().all(u8::is_ascii_whitespace) {
        return;
    }
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{value}"),
        },
        Err(_) => println!("{}", String::from_utf8_lossy(body)),
    }
}
