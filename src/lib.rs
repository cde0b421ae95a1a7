pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::SessionStore;

use config::{session::SessionLayer, AppConfig};
use repositories::UserRepository;
use services::{auth_service::AuthService, password::PasswordHasher};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(user_repository: Arc<dyn UserRepository>, config: AppConfig) -> Self {
        let hasher = PasswordHasher::new(config.pbkdf2_rounds);
        Self {
            auth_service: Arc::new(AuthService::new(user_repository, hasher)),
            config: Arc::new(config),
        }
    }
}

/// Builds the application router with every route, layer, and the state.
pub fn build_router<Store>(state: AppState, session_layer: SessionLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    let protected_routes = Router::new()
        .route("/secrets", get(handlers::secrets))
        .route("/download", get(handlers::download))
        .route("/logout", get(auth::handlers::logout_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/register",
            get(auth::handlers::register_page).post(auth::handlers::register_handler),
        )
        .route(
            "/login",
            get(auth::handlers::login_page).post(auth::handlers::login_handler),
        )
        .merge(protected_routes)
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .layer(session_layer)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::add_security_headers,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
