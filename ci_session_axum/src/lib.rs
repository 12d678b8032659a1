//! Axum integration for `ci-session`.
//!
//! ```no_run
//! use axum::{Router, middleware::from_fn_with_state, routing::get};
//! use ci_session::{SessionBinding, SessionConfig};
//! use ci_session_axum::{CiSession, require_session};
//!
//! async fn dashboard(session: CiSession) -> String {
//!     session.get_flash_string("info").await.unwrap_or_default()
//! }
//!
//! let binding = SessionBinding::new(SessionConfig::from_env());
//! let app: Router = Router::new()
//!     .route("/dashboard", get(dashboard))
//!     .route_layer(from_fn_with_state(binding.clone(), require_session))
//!     .with_state(binding);
//! ```

mod config;
mod cookie;
mod error;
mod middleware;
mod session;

pub use config::{CI_SESSION_COOKIE_NAME, CI_SESSION_REDIRECT_ANON};
pub use cookie::{clear_session_cookie, set_session_cookie};
pub use error::IntoResponseError;
pub use middleware::require_session;
pub use session::{CiSession, SessionRedirect};
