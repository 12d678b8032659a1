use std::ops::Deref;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Redirect, Response},
};
use ci_session::SessionRecord;
use http::{Method, StatusCode, request::Parts};

use super::config::CI_SESSION_REDIRECT_ANON;

/// Response for a request without a usable session.
///
/// GET requests are redirected to `CI_SESSION_REDIRECT_ANON`; everything else
/// gets a plain 401.
pub struct SessionRedirect {
    method: Method,
}

impl SessionRedirect {
    pub(crate) fn new(method: Method) -> Self {
        Self { method }
    }
}

impl IntoResponse for SessionRedirect {
    fn into_response(self) -> Response {
        if self.method == Method::GET {
            tracing::debug!("Redirecting to {}", CI_SESSION_REDIRECT_ANON.as_str());
            Redirect::temporary(CI_SESSION_REDIRECT_ANON.as_str()).into_response()
        } else {
            tracing::debug!("Unauthorized");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

/// The current request's session, available as an Axum extractor
///
/// Only routes behind [`require_session`](crate::require_session) have one;
/// elsewhere the extractor fails with 500.
///
/// ```no_run
/// use ci_session_axum::CiSession;
///
/// async fn dashboard(session: CiSession) -> String {
///     session.get_flash_string("info").await.unwrap_or_default()
/// }
/// ```
#[derive(Clone, Debug)]
pub struct CiSession(Arc<SessionRecord>);

impl CiSession {
    pub(crate) fn new(record: Arc<SessionRecord>) -> Self {
        Self(record)
    }

    pub fn record(&self) -> &Arc<SessionRecord> {
        &self.0
    }
}

impl Deref for CiSession {
    type Target = SessionRecord;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CiSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CiSession>().cloned().ok_or_else(|| {
            tracing::error!("CiSession extractor used on a route without require_session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Session middleware not installed",
            )
        })
    }
}

impl<S> OptionalFromRequestParts<S> for CiSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CiSession>().cloned())
    }
}
