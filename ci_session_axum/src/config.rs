//! Settings for the axum integration, read once from the environment

use std::sync::LazyLock;

/// Name of the cookie carrying the session id.
/// Default: "ci_session", the CodeIgniter default `sess_cookie_name`
pub static CI_SESSION_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("CI_SESSION_COOKIE_NAME").unwrap_or_else(|_| "ci_session".to_string())
});

/// Where anonymous GET requests are sent.
/// Default: "/login"
pub static CI_SESSION_REDIRECT_ANON: LazyLock<String> = LazyLock::new(|| {
    std::env::var("CI_SESSION_REDIRECT_ANON").unwrap_or_else(|_| "/login".to_string())
});
