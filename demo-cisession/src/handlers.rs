use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use ci_session::SessionBinding;
use ci_session_axum::{CiSession, IntoResponseError, clear_session_cookie, set_session_cookie};
use http::StatusCode;

const LOGIN_KEY: &str = "my_login_session";
const FLASH_KEY: &str = "info";

#[derive(Template)]
#[template(
    source = r#"<html><body>
<form method="POST"><input type="submit" value="login"></form>
</body></html>"#,
    ext = "html"
)]
struct LoginTemplate;

#[derive(Template)]
#[template(
    source = r#"<html><body>
<form action="/logout" method="POST"><input type="submit" value="logout"></form>
<br>Login: {{ login }}
<br>Flash: {{ flash }}
<br>Flash message will disappear on reload
</body></html>"#,
    ext = "html"
)]
struct LoggedInTemplate<'a> {
    login: &'a str,
    flash: &'a str,
}

fn render(template: &impl Template) -> Result<Html<String>, (StatusCode, String)> {
    template
        .render()
        .map(Html)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

pub(crate) async fn login_page() -> Result<Html<String>, (StatusCode, String)> {
    render(&LoginTemplate)
}

pub(crate) async fn login(
    State(binding): State<SessionBinding>,
) -> Result<Response, (StatusCode, String)> {
    let record = binding.create_and_bind().into_response_error()?;
    binding
        .scoped(record.clone(), |session| async move {
            session.set_user_data(LOGIN_KEY, "logged_in").await?;
            session.set_flash(FLASH_KEY, "THIS IS A FLASH MESSAGE").await
        })
        .await
        .into_response_error()?;
    tracing::info!("Logged in session {}", record.id());

    let mut response = Redirect::to("/loggedin").into_response();
    set_session_cookie(
        response.headers_mut(),
        record.id(),
        binding.config().expiry_secs,
    )
    .into_response_error()?;
    Ok(response)
}

pub(crate) async fn logged_in(session: CiSession) -> Result<Html<String>, (StatusCode, String)> {
    let login = session
        .get_user_data(LOGIN_KEY)
        .await
        .map(|v| v.to_string())
        .unwrap_or_default();
    let flash = session.get_flash_string(FLASH_KEY).await.into_response_error()?;
    render(&LoggedInTemplate {
        login: &login,
        flash: &flash,
    })
}

pub(crate) async fn logout(
    State(binding): State<SessionBinding>,
    session: CiSession,
) -> Result<Response, (StatusCode, String)> {
    binding.destroy(&session).await.into_response_error()?;
    tracing::info!("Logged out session {}", session.id());

    let mut response = Redirect::to("/login").into_response();
    clear_session_cookie(response.headers_mut()).into_response_error()?;
    Ok(response)
}
