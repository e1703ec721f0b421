use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::warn;

use crate::auth::{
    middleware::{authenticate, require_capability},
    AuthService, Capability, JwtKeys, LoginService, UserService,
};
use crate::config::{AppConfig, AuthConfig, ServerConfig};
use crate::guard::{edge_guard, RouteGuard};
use crate::observability::trace_http_requests;
use crate::storage::DbPool;

use super::{
    docs,
    error::ApiError,
    handlers::{
        change_password_handler, create_user, get_user, health_handler, list_users,
        login_handler, logout_handler, profile_handler, refresh_handler, reset_user_password,
        update_user, update_user_status,
    },
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub pool: DbPool,
    pub login_service: Arc<LoginService>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub auth_config: Arc<AuthConfig>,
}

impl ApiState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        let keys = Arc::new(JwtKeys::from_config(&config.auth));
        Self {
            login_service: Arc::new(LoginService::with_sqlx(pool.clone(), keys.clone())),
            auth_service: Arc::new(AuthService::with_sqlx(pool.clone(), keys)),
            user_service: Arc::new(UserService::with_sqlx(pool.clone())),
            auth_config: Arc::new(config.auth.clone()),
            pool,
        }
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn not_found_handler() -> ApiError {
    ApiError::not_found("Resource not found")
}

pub fn build_router(state: ApiState, config: &AppConfig) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.auth_service.clone(), authenticate);
    let capability_layer =
        |capability: Capability| middleware::from_fn_with_state(capability, require_capability);

    let public_api = Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/refresh", post(refresh_handler))
        .route("/api/v1/auth/logout", post(logout_handler));

    let user_management = Router::new()
        .route("/api/v1/users", get(list_users).post(create_user))
        .route("/api/v1/users/{id}", get(get_user).patch(update_user))
        .route("/api/v1/users/{id}/status", put(update_user_status))
        .route("/api/v1/users/{id}/password", put(reset_user_password))
        .route_layer(capability_layer(Capability::ManageUsers));

    let secured_api = Router::new()
        .route("/api/v1/auth/profile", get(profile_handler))
        .route("/api/v1/auth/profile/password", put(change_password_handler))
        .merge(user_management)
        .route_layer(auth_layer);

    let mut router = public_api.merge(secured_api).with_state(state).merge(docs::docs_router());

    router = match &config.web.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(not_found_handler),
    };

    let guard = Arc::new(RouteGuard::from_config(&config.web));
    router = router.layer(middleware::from_fn_with_state(guard, edge_guard));

    if config.server.enable_cors {
        router = router.layer(cors_layer(&config.server));
    }

    router.layer(middleware::from_fn(trace_http_requests))
}
