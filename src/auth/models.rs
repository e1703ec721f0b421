//! Request-scoped authentication context and the errors the auth stack returns.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::role::{Capability, Role};
use crate::auth::user::UserProfile;
use crate::domain::UserId;
use crate::errors::Error;

/// Cookie holding the access token; read by the client and the edge guard.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie holding the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Identity established by a valid access token, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: UserId, username: String, email: String, role: Role) -> Self {
        Self { user_id, username, email, role }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }
}

/// Errors returned by authentication middleware/services.
///
/// Every variant except `Forbidden` and `Persistence` is reported to clients as
/// the same generic 401; the variant itself is only logged and counted.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthorized: bearer token missing")]
    MissingToken,
    #[error("unauthorized: malformed token")]
    TokenMalformed,
    #[error("unauthorized: token expired")]
    TokenExpired,
    #[error("unauthorized: invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized: user inactive or missing")]
    UserInactiveOrMissing,
    #[error("forbidden: missing required capability")]
    Forbidden,
    #[error(transparent)]
    Persistence(#[from] Error),
}

impl AuthError {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::TokenMalformed => "token_malformed",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::UserInactiveOrMissing => "user_inactive_or_missing",
            AuthError::Forbidden => "forbidden",
            AuthError::Persistence(_) => "persistence",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        !matches!(self, AuthError::Forbidden | AuthError::Persistence(_))
    }
}

/// Access and refresh tokens returned together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Successful login: a fresh token pair plus the caller's profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

impl LoginResponse {
    pub fn new(pair: TokenPair, user: UserProfile) -> Self {
        Self { access_token: pair.access_token, refresh_token: pair.refresh_token, user }
    }

    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}
