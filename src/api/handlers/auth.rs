//! Login, refresh, logout and self-service profile endpoints.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;
use validator::Validate;

use crate::api::error::{ApiError, ErrorBody};
use crate::api::routes::ApiState;
use crate::auth::models::{
    AuthContext, LoginResponse, TokenPair, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::auth::user::{ChangePasswordRequest, LoginRequest, UserProfile};
use crate::config::AuthConfig;
use crate::errors::Error;

fn token_cookie(
    name: &'static str,
    value: String,
    max_age_seconds: i64,
    config: &AuthConfig,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(false)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}

/// Add both token cookies to the jar.
pub fn set_token_cookies(jar: CookieJar, pair: &TokenPair, config: &AuthConfig) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        config.access_cookie_max_age_seconds,
        config,
    ))
    .add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        config.refresh_cookie_max_age_seconds,
        config,
    ))
}

/// Overwrite both token cookies with expired, empty values.
pub fn clear_token_cookies(jar: CookieJar, config: &AuthConfig) -> CookieJar {
    jar.add(token_cookie(ACCESS_TOKEN_COOKIE, String::new(), 0, config))
        .add(token_cookie(REFRESH_TOKEN_COOKIE, String::new(), 0, config))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse,
         headers(("Set-Cookie" = String, description = "accessToken and refreshToken cookies"))),
        (status = 400, description = "Missing identifier or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 503, description = "Credential store unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<ApiState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    payload.validate().map_err(|err| ApiError::from(Error::from(err)))?;

    let response = state.login_service.login(&payload).await?;
    let jar = set_token_cookies(jar, &response.tokens(), &state.auth_config);

    Ok((jar, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    responses(
        (status = 200, description = "New token pair issued", body = TokenPair,
         headers(("Set-Cookie" = String, description = "accessToken and refreshToken cookies"))),
        (status = 401, description = "Refresh token missing, invalid, expired, or user inactive; both cookies are cleared", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenPair>), (CookieJar, ApiError)> {
    let header = match headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) {
        Some(header) => header.to_string(),
        None => jar
            .get(REFRESH_TOKEN_COOKIE)
            .map(|cookie| format!("Bearer {}", cookie.value()))
            .unwrap_or_default(),
    };

    match state.auth_service.refresh(&header).await {
        Ok(pair) => {
            let jar = set_token_cookies(jar, &pair, &state.auth_config);
            Ok((jar, Json(pair)))
        }
        Err(err) => {
            warn!(reason = err.reason(), "refresh failed, clearing session cookies");
            Err((clear_token_cookies(jar, &state.auth_config), err.into()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Session cookies cleared")
    ),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<ApiState>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    (clear_token_cookies(jar, &state.auth_config), StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    responses(
        (status = 200, description = "Current user's profile", body = UserProfile),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "auth"
)]
pub async fn profile_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state.user_service.get_user(&context.user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/profile/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password too short", body = ErrorBody),
        (status = 401, description = "Current password incorrect", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "auth"
)]
pub async fn change_password_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .user_service
        .change_password(&context.user_id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
