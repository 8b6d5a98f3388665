use crate::models::auth::{LoginOutcome, LoginRequest};
use crate::models::config::AppConfig;
use crate::services::auth::{SessionService, SESSION_COOKIE};
use crate::services::generation::{ContentProvider, GenerationClient};
use crate::services::rate_limit::RateLimiter;
use anyhow::Result;
use askama::Template;
use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_cookies::cookie::{time::Duration as CookieDuration, SameSite};
use tower_cookies::{Cookie, CookieManagerLayer, Cookies};
use tower_http::{
    compression::CompressionLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

mod api;
pub mod gate;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<String>,
}

fn render_login(error: Option<&str>) -> Html<String> {
    let template = LoginTemplate {
        error: error.map(str::to_string),
    };
    Html(template.render().unwrap_or_else(|_| "Template error".to_string()))
}

// State
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub generator: Arc<GenerationClient>,
    pub limiter: Arc<RateLimiter>,
    /// Present only in the authenticated deployment.
    pub sessions: Option<Arc<SessionService>>,
}

impl AppState {
    pub fn new(config: AppConfig, provider: Arc<dyn ContentProvider>) -> Result<Self> {
        let sessions = if config.auth.enabled {
            Some(Arc::new(SessionService::new(&config.auth)?))
        } else {
            None
        };

        Ok(Self {
            generator: Arc::new(GenerationClient::new(provider, config.provider.model.clone())),
            limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
            sessions,
            config: Arc::new(config),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/moodboard", post(api::moodboard))
        .route("/preview", post(api::preview))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::rate_limit,
        ));

    let static_dir = PathBuf::from(&state.config.server.static_dir);
    let spa = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let mut public = Router::new().route("/health", get(health));
    let mut protected = Router::new().nest("/api", api_routes).fallback_service(spa);

    if state.sessions.is_some() {
        public = public
            .route("/login", get(login_page).post(login_handler))
            .route("/logout", get(logout_handler));
        protected = protected.layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_session,
        ));
    }

    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.server.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

// Routes
async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn login_page(State(state): State<AppState>, cookies: Cookies) -> impl IntoResponse {
    if gate::is_authenticated(&state, &cookies) {
        return Redirect::to("/").into_response();
    }
    render_login(None).into_response()
}

async fn login_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(req): Form<LoginRequest>,
) -> impl IntoResponse {
    let Some(sessions) = state.sessions.clone() else {
        return Redirect::to("/").into_response();
    };

    // argon2 is CPU-bound
    let username = req.username.clone();
    let checker = Arc::clone(&sessions);
    let outcome = tokio::task::spawn_blocking(move || checker.login(&req))
        .await
        .unwrap_or_else(|e| Err(anyhow::anyhow!("login task failed: {e}")));

    match outcome {
        Ok(LoginOutcome::Authenticated { token }) => {
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .http_only(true)
                .secure(state.config.auth.production)
                .same_site(SameSite::Lax)
                .path("/")
                .max_age(CookieDuration::seconds(
                    sessions.session_duration().num_seconds(),
                ));
            cookies.add(cookie.into());

            info!("Operator logged in");
            Redirect::to("/").into_response()
        }
        Ok(LoginOutcome::Rejected) => {
            warn!(%username, "Rejected login attempt");
            render_login(Some(INVALID_CREDENTIALS)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Login check failed");
            render_login(Some("Login failed, please try again")).into_response()
        }
    }
}

async fn logout_handler(cookies: Cookies) -> impl IntoResponse {
    cookies.remove(gate::removal_cookie());
    Redirect::to("/login")
}
