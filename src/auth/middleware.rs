//! Axum middleware for authentication and authorization.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, State},
    http::{header::AUTHORIZATION, Method, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::api::error::ApiError;
use crate::auth::auth_service::AuthService;
use crate::auth::models::{AuthContext, AuthError, ACCESS_TOKEN_COOKIE};
use crate::auth::role::Capability;
use tracing::{field, info_span, warn, Instrument};

pub type AuthServiceState = Arc<AuthService>;

/// Middleware entry point that authenticates requests using the configured [`AuthService`].
///
/// The `Authorization` header is used when present; otherwise the
/// `accessToken` cookie is tried.
pub async fn authenticate(
    State(auth_service): State<AuthServiceState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let correlation_id = uuid::Uuid::new_v4();
    let span = info_span!(
        "auth_middleware.authenticate",
        http.method = %request.method(),
        http.path = %request.uri().path(),
        auth.user_id = field::Empty,
        correlation_id = %correlation_id
    );

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let result = match header {
        Some(header) => auth_service.authenticate(&header).instrument(span.clone()).await,
        None => {
            let jar = CookieJar::from_headers(request.headers());
            match jar.get(ACCESS_TOKEN_COOKIE) {
                Some(cookie) => {
                    auth_service.authenticate_token(cookie.value()).instrument(span.clone()).await
                }
                None => auth_service.authenticate("").instrument(span.clone()).await,
            }
        }
    };

    match result {
        Ok(context) => {
            span.record("auth.user_id", field::display(&context.user_id));
            request.extensions_mut().insert(context);
            Ok(next.run(request).await)
        }
        Err(err) => {
            span.in_scope(|| {
                warn!(%correlation_id, reason = err.reason(), error = %err, "authentication failed")
            });
            Err(err.into())
        }
    }
}

/// Middleware entry point that verifies the caller's role grants a capability.
pub async fn require_capability(
    State(capability): State<Capability>,
    Extension(context): Extension<AuthContext>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if context.can(capability) {
        return Ok(next.run(request).await);
    }

    warn!(
        user_id = %context.user_id,
        role = %context.role,
        capability = ?capability,
        path = %request.uri().path(),
        "capability check failed"
    );
    Err(AuthError::Forbidden.into())
}
