use axum::Router;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::error::ErrorBody;
use crate::api::handlers::{HealthResponse, ListUsersResponse};
use crate::auth::models::{LoginResponse, TokenPair};
use crate::auth::role::Role;
use crate::auth::user::{
    ChangePasswordRequest, CreateUserRequest, Gender, LoginRequest, ResetPasswordRequest,
    UpdateStatusRequest, UpdateUserRequest, User, UserProfile, UserStatus,
};
use crate::domain::UserId;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DYHE Back-Office API",
        description = "Authentication, session and account management for the DYHE back-office.\n\n\
            Access tokens are short-lived JWTs sent as `Authorization: Bearer <token>` or in the \
            `accessToken` cookie. A refresh token exchanges for a new pair at `/api/v1/auth/refresh`.",
        version = env!("CARGO_PKG_VERSION"),
    ),
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::auth::login_handler,
        crate::api::handlers::auth::refresh_handler,
        crate::api::handlers::auth::logout_handler,
        crate::api::handlers::auth::profile_handler,
        crate::api::handlers::auth::change_password_handler,
        crate::api::handlers::users::create_user,
        crate::api::handlers::users::list_users,
        crate::api::handlers::users::get_user,
        crate::api::handlers::users::update_user,
        crate::api::handlers::users::update_user_status,
        crate::api::handlers::users::reset_user_password,
    ),
    components(
        schemas(
            ErrorBody,
            HealthResponse,
            LoginRequest,
            LoginResponse,
            TokenPair,
            UserProfile,
            ChangePasswordRequest,
            User,
            UserId,
            Role,
            UserStatus,
            Gender,
            CreateUserRequest,
            UpdateUserRequest,
            UpdateStatusRequest,
            ResetPasswordRequest,
            ListUsersResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "auth", description = "Login, token refresh and the caller's own profile"),
        (name = "users", description = "Account management (SUPER_ADMIN only)"),
    ),
    security(
        ("bearerAuth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build(),
            ),
        );
    }
}

pub fn docs_router() -> Router {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();

        for expected in [
            "/health",
            "/api/v1/auth/login",
            "/api/v1/auth/refresh",
            "/api/v1/auth/logout",
            "/api/v1/auth/profile",
            "/api/v1/auth/profile/password",
            "/api/v1/users",
            "/api/v1/users/{id}",
            "/api/v1/users/{id}/status",
            "/api/v1/users/{id}/password",
        ] {
            assert!(paths.iter().any(|p| p == expected), "Missing path {}", expected);
        }
    }

    #[test]
    fn registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearerAuth"));
        assert!(components.schemas.contains_key("LoginResponse"));
    }
}
