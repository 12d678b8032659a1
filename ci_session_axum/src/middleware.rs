use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use ci_session::{SessionBinding, SessionError, session_id_from_headers};

use super::config::CI_SESSION_COOKIE_NAME;
use super::cookie::set_session_cookie;
use super::error::status_for;
use super::session::{CiSession, SessionRedirect};

// Unknown, expired and malformed sessions look the same as a missing cookie.
fn handle_session_error(err: SessionError, req: &Request) -> Response {
    match status_for(&err) {
        StatusCode::UNAUTHORIZED => {
            tracing::debug!("Rejecting session: {}", err);
            SessionRedirect::new(req.method().clone()).into_response()
        }
        status => {
            tracing::error!("Failed to load session: {}", err);
            (status, err.to_string()).into_response()
        }
    }
}

/// Loads the session named by the session cookie, or rejects the request.
///
/// Install with `axum::middleware::from_fn_with_state(binding, require_session)`.
/// The handler sees the record through the [`CiSession`] extractor. After the
/// handler returns, the record is persisted and the cookie refreshed for
/// another `expiry_secs`, unless the handler destroyed the session.
pub async fn require_session(
    State(binding): State<SessionBinding>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match session_id_from_headers(req.headers(), CI_SESSION_COOKIE_NAME.as_str()) {
        Ok(Some(token)) if !token.is_empty() => token.to_string(),
        Ok(_) => {
            tracing::debug!("No session cookie '{}'", CI_SESSION_COOKIE_NAME.as_str());
            return SessionRedirect::new(req.method().clone()).into_response();
        }
        Err(e) => {
            tracing::debug!("Unreadable cookie header: {}", e);
            return SessionRedirect::new(req.method().clone()).into_response();
        }
    };

    let record = match binding.resolve_from_token(&token).await {
        Ok(record) => record,
        Err(err) => return handle_session_error(err, &req),
    };

    req.extensions_mut().insert(CiSession::new(record.clone()));
    let mut response = next.run(req).await;

    if let Err(e) = binding.persist(&record).await {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    if !record.is_destroyed() {
        if let Err(e) = set_session_cookie(
            response.headers_mut(),
            record.id(),
            binding.config().expiry_secs,
        ) {
            tracing::error!("Failed to refresh session cookie: {}", e);
        }
    }

    response
}
