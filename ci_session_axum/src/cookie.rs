use ci_session::{SessionError, SessionId, header_set_cookie};
use http::HeaderMap;

use super::config::CI_SESSION_COOKIE_NAME;

const COOKIE_ATTRIBUTES: &str = "; SameSite=Lax";

/// Sets the session cookie to `id`, valid for `max_age` seconds.
pub fn set_session_cookie(
    headers: &mut HeaderMap,
    id: &SessionId,
    max_age: u64,
) -> Result<(), SessionError> {
    let max_age = i64::try_from(max_age).unwrap_or(i64::MAX);
    header_set_cookie(
        headers,
        CI_SESSION_COOKIE_NAME.as_str(),
        id.as_str(),
        max_age,
        COOKIE_ATTRIBUTES,
    )?;
    Ok(())
}

/// Tells the browser to drop the session cookie.
pub fn clear_session_cookie(headers: &mut HeaderMap) -> Result<(), SessionError> {
    header_set_cookie(
        headers,
        CI_SESSION_COOKIE_NAME.as_str(),
        "",
        -1,
        COOKIE_ATTRIBUTES,
    )?;
    Ok(())
}
