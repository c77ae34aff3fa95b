//! Header names and request classification shared by the request pipeline.

use regex::Regex;
use reqwest::Method;
use std::sync::LazyLock;
use ulid::Ulid;
use uuid::Uuid;

/// Trace correlation header sent on every attempt.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Anti-CSRF header sent on state-changing requests.
pub const XSRF_HEADER: &str = "x-xsrf-token";
/// Header the server uses to issue or rotate the CSRF token.
pub const CSRF_RESPONSE_HEADER: &str = "x-csrf-token";
/// Replay-safety header for financial mutations.
pub const IDEMPOTENCY_HEADER: &str = "x-idempotency-key";

static FINANCIAL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|/)(wallets?|transactions?|withdraw[a-z_-]*|top-?ups?[a-z_-]*)(/|$)")
        .expect("valid financial path pattern")
});

/// POST, PUT, PATCH and DELETE change server state.
#[must_use]
pub fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Wallet, transaction, withdrawal and top-up endpoints move money.
#[must_use]
pub fn is_financial_path(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    FINANCIAL_PATH.is_match(path)
}

/// True when the request must carry an idempotency key.
#[must_use]
pub fn needs_idempotency_key(method: &Method, path: &str) -> bool {
    is_state_changing(method) && is_financial_path(path)
}

#[must_use]
pub fn new_request_id() -> String {
    Ulid::new().to_string()
}

#[must_use]
pub fn new_idempotency_key() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutating_methods_are_state_changing() {
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(is_state_changing(&method), "{method} should mutate");
        }
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(!is_state_changing(&method), "{method} should not mutate");
        }
    }

    #[test]
    fn financial_paths_are_detected() {
        for path in [
            "/wallet",
            "/wallet/withdraw",
            "/wallets/42/balance",
            "/transactions",
            "/transactions/7/release",
            "/withdraw",
            "/withdrawals/pending",
            "/topup",
            "/top-up/card",
            "/api/v1/wallet/topup?currency=usd",
        ] {
            assert!(is_financial_path(path), "{path} should be financial");
        }
    }

    #[test]
    fn non_financial_paths_are_ignored() {
        for path in [
            "/user/profile",
            "/auth/csrf",
            "/walletconnect",
            "/disputes/5",
            "/escrows?status=open",
        ] {
            assert!(!is_financial_path(path), "{path} should not be financial");
        }
    }

    #[test]
    fn idempotency_needs_both_conditions() {
        assert!(needs_idempotency_key(&Method::POST, "/wallet/withdraw"));
        assert!(!needs_idempotency_key(&Method::GET, "/transactions"));
        assert!(!needs_idempotency_key(&Method::POST, "/user/profile"));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(new_request_id(), new_request_id());
        assert_ne!(new_idempotency_key(), new_idempotency_key());
    }
}
