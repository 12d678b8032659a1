use axum::{Router, middleware::from_fn_with_state, routing::get};
use ci_session::{SessionBinding, SessionConfig};
use ci_session_axum::require_session;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;
mod server;

use crate::{
    handlers::{logged_in, login, login_page, logout},
    server::spawn_http_server,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,ci_session=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let binding = SessionBinding::new(SessionConfig::from_env());

    let protected = Router::new()
        .route("/loggedin", get(logged_in))
        .route("/logout", get(logout).post(logout))
        .route_layer(from_fn_with_state(binding.clone(), require_session));

    let app = Router::new()
        .route("/login", get(login_page).post(login))
        .merge(protected)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(binding);

    spawn_http_server(8081, app).await??;
    Ok(())
}
