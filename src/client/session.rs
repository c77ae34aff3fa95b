//! Session refresh coordination. A 401 on a first attempt triggers one silent
//! `POST /auth/refresh`; concurrent 401s join that same refresh. When renewal
//! fails, local session state is cleared and the user is sent to login.

use super::{
    config::Surface, csrf::CsrfStore, errors::ApiError, navigator::Navigator,
    single_flight::SingleFlight, user_cache::UserCache,
};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use tokio::time::timeout;
use tracing::{debug, info, warn};

const REFRESH_FLIGHT: &str = "session-refresh";

/// Paths that must never appear as the redirect origin.
const AUTH_SURFACES: [&str; 2] = ["/login", "/register"];

/// Refresh coordinator states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshState {
    #[default]
    Authenticated,
    RefreshInFlight,
    RefreshSucceeded,
    RefreshFailed,
}

/// Whether a failed session should navigate away from `current_path`.
#[must_use]
pub fn should_redirect(surface: Surface, current_path: &str) -> bool {
    if surface == Surface::Public {
        return false;
    }
    !AUTH_SURFACES
        .iter()
        .any(|surface_path| current_path.contains(surface_path))
}

pub(crate) struct SessionCoordinator {
    flight: SingleFlight<Result<(), ApiError>>,
    state: Mutex<RefreshState>,
    generation: AtomicU64,
    csrf: Arc<CsrfStore>,
    user_cache: Arc<UserCache>,
    navigator: Arc<dyn Navigator>,
    surface: Surface,
    login_path: String,
    refresh_timeout: Duration,
}

impl SessionCoordinator {
    pub(crate) fn new(
        csrf: Arc<CsrfStore>,
        user_cache: Arc<UserCache>,
        navigator: Arc<dyn Navigator>,
        surface: Surface,
        login_path: &str,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            flight: SingleFlight::new(),
            state: Mutex::new(RefreshState::default()),
            generation: AtomicU64::new(0),
            csrf,
            user_cache,
            navigator,
            surface,
            login_path: login_path.to_string(),
            refresh_timeout,
        }
    }

    pub(crate) fn state(&self) -> RefreshState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts session renewals. A request records it before dispatch; a 401
    /// for an older generation was answered with the previous session.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn mark_authenticated(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.set_state(RefreshState::Authenticated);
    }

    /// Renews the session, or joins the renewal already in flight.
    ///
    /// `refresh` only runs for the caller that starts the flight. Every caller
    /// receives the same outcome; a failure is reported as
    /// [`ApiError::SessionExpired`] after local state has been cleared once.
    pub(crate) async fn renew<F, Fut>(&self, refresh: F) -> Result<(), ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ApiError>>,
    {
        self.flight
            .run(REFRESH_FLIGHT, move || async move {
                self.set_state(RefreshState::RefreshInFlight);
                debug!("refreshing session");

                let outcome = match timeout(self.refresh_timeout, refresh()).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ApiError::Timeout(format!(
                        "Session refresh did not settle within {}s",
                        self.refresh_timeout.as_secs_f32()
                    ))),
                };

                match outcome {
                    Ok(()) => {
                        self.generation.fetch_add(1, Ordering::AcqRel);
                        self.set_state(RefreshState::RefreshSucceeded);
                        info!("session refreshed");
                        Ok(())
                    }
                    Err(err) => {
                        warn!("Session refresh failed: {err}");
                        self.end_session();
                        Err(ApiError::SessionExpired(err.to_string()))
                    }
                }
            })
            .await
    }

    /// Marks the session failed, clears CSRF and cached user state, then
    /// redirects to login unless the redirect policy forbids it.
    pub(crate) fn end_session(&self) {
        self.set_state(RefreshState::RefreshFailed);
        self.csrf.clear();
        self.user_cache.clear();

        let current_path = self.navigator.current_path();
        if should_redirect(self.surface, &current_path) {
            info!(
                from = %current_path,
                to = %self.login_path,
                "session ended, redirecting to login"
            );
            self.navigator.navigate(&self.login_path);
        } else {
            debug!(path = %current_path, surface = %self.surface, "session ended without redirect");
        }
    }

    fn set_state(&self, state: RefreshState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{navigator::MemoryNavigator, user_cache::CachedUser};
    use std::sync::atomic::AtomicU32;
    use tokio::time::sleep;

    struct Fixture {
        coordinator: Arc<SessionCoordinator>,
        csrf: Arc<CsrfStore>,
        user_cache: Arc<UserCache>,
        navigator: Arc<MemoryNavigator>,
    }

    fn fixture(surface: Surface, current_path: &str, refresh_timeout: Duration) -> Fixture {
        let csrf = Arc::new(CsrfStore::new());
        csrf.set("token");
        let user_cache = Arc::new(UserCache::new());
        user_cache.set(&CachedUser {
            id: "1".to_string(),
            username: "alice".to_string(),
            email: None,
            role: None,
        });
        let navigator = Arc::new(MemoryNavigator::new(current_path));
        let coordinator = Arc::new(SessionCoordinator::new(
            Arc::clone(&csrf),
            Arc::clone(&user_cache),
            navigator.clone(),
            surface,
            "/login",
            refresh_timeout,
        ));
        Fixture {
            coordinator,
            csrf,
            user_cache,
            navigator,
        }
    }

    #[test]
    fn redirect_policy() {
        assert!(should_redirect(Surface::App, "/dashboard"));
        assert!(!should_redirect(Surface::App, "/login"));
        assert!(!should_redirect(Surface::App, "/auth/register?step=2"));
        assert!(!should_redirect(Surface::Public, "/pricing"));
    }

    #[tokio::test]
    async fn successful_refresh_keeps_state() {
        let fx = fixture(Surface::App, "/dashboard", Duration::from_secs(1));
        assert_eq!(fx.coordinator.state(), RefreshState::Authenticated);

        let result = fx.coordinator.renew(|| async { Ok(()) }).await;

        assert_eq!(result, Ok(()));
        assert_eq!(fx.coordinator.state(), RefreshState::RefreshSucceeded);
        assert_eq!(fx.coordinator.generation(), 1);
        assert!(fx.csrf.is_present());
        assert!(fx.user_cache.get().is_some());
        assert_eq!(fx.navigator.navigations(), 0);
    }

    #[tokio::test]
    async fn each_renewal_starts_a_new_generation() {
        let fx = fixture(Surface::App, "/dashboard", Duration::from_secs(1));
        let dispatched_at = fx.coordinator.generation();

        let result = fx.coordinator.renew(|| async { Ok(()) }).await;
        assert_eq!(result, Ok(()));
        assert!(fx.coordinator.generation() > dispatched_at);

        let after_refresh = fx.coordinator.generation();
        fx.coordinator.mark_authenticated();
        assert!(fx.coordinator.generation() > after_refresh);
        assert_eq!(fx.coordinator.state(), RefreshState::Authenticated);
    }

    #[tokio::test]
    async fn failed_refresh_clears_and_redirects_once() {
        let fx = fixture(Surface::App, "/dashboard", Duration::from_secs(1));
        let calls = Arc::new(AtomicU32::new(0));

        let attempt = |calls: Arc<AtomicU32>| {
            let coordinator = Arc::clone(&fx.coordinator);
            async move {
                coordinator
                    .renew(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(30)).await;
                        Err(ApiError::Http {
                            status: 401,
                            message: "expired".to_string(),
                        })
                    })
                    .await
            }
        };

        let (first, second, third) = tokio::join!(
            attempt(Arc::clone(&calls)),
            attempt(Arc::clone(&calls)),
            attempt(Arc::clone(&calls)),
        );

        for result in [first, second, third] {
            assert!(matches!(result, Err(ApiError::SessionExpired(_))));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.coordinator.state(), RefreshState::RefreshFailed);
        assert_eq!(fx.coordinator.generation(), 0);
        assert!(!fx.csrf.is_present());
        assert!(fx.user_cache.get().is_none());
        assert_eq!(fx.navigator.history(), vec!["/dashboard", "/login"]);
    }

    #[tokio::test]
    async fn slow_refresh_is_bounded() {
        let fx = fixture(Surface::App, "/wallet", Duration::from_millis(20));

        let result = fx
            .coordinator
            .renew(|| async {
                sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        let message = match result {
            Err(ApiError::SessionExpired(message)) => message,
            other => panic!("expected an expired session, got {other:?}"),
        };
        assert!(message.contains("did not settle"));
        assert_eq!(fx.navigator.navigations(), 1);
    }

    #[test]
    fn end_session_on_login_page_does_not_navigate() {
        let fx = fixture(Surface::App, "/login?next=/wallet", Duration::from_secs(1));
        fx.coordinator.end_session();
        assert!(!fx.csrf.is_present());
        assert_eq!(fx.coordinator.state(), RefreshState::RefreshFailed);
        assert_eq!(fx.navigator.navigations(), 0);
    }

    #[test]
    fn end_session_on_public_surface_does_not_navigate() {
        let fx = fixture(Surface::Public, "/pricing", Duration::from_secs(1));
        fx.coordinator.end_session();
        assert!(fx.user_cache.get().is_none());
        assert_eq!(fx.navigator.navigations(), 0);
    }
}
