//! Bearer-token validation for access tokens and the stateless refresh flow.

use std::sync::Arc;

use tracing::{field, info, instrument, warn};

use crate::auth::jwt::{Claims, JwtKeys};
use crate::auth::models::{AuthContext, AuthError, TokenPair};
use crate::auth::user::User;
use crate::observability::metrics;
use crate::storage::repositories::{SqlxUserRepository, UserRepository};

/// Pull the token out of an `Authorization` header value.
///
/// An empty or whitespace-only header counts as missing; anything that is not
/// the `Bearer` scheme with a non-empty token is malformed.
pub fn bearer_token(header: &str) -> std::result::Result<&str, AuthError> {
    let header = header.trim();
    if header.is_empty() {
        return Err(AuthError::MissingToken);
    }

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::TokenMalformed),
    }
}

#[derive(Clone)]
pub struct AuthService {
    repository: Arc<dyn UserRepository>,
    keys: Arc<JwtKeys>,
}

impl AuthService {
    pub fn new(repository: Arc<dyn UserRepository>, keys: Arc<JwtKeys>) -> Self {
        Self { repository, keys }
    }

    pub fn with_sqlx(pool: crate::storage::DbPool, keys: Arc<JwtKeys>) -> Self {
        Self::new(Arc::new(SqlxUserRepository::new(pool)), keys)
    }

    /// Validate an `Authorization: Bearer <access token>` header value.
    #[instrument(skip(self, header), fields(user_id = field::Empty))]
    pub async fn authenticate(&self, header: &str) -> std::result::Result<AuthContext, AuthError> {
        let result = match bearer_token(header) {
            Ok(token) => self.check_access_token(token).await,
            Err(err) => Err(err),
        };
        self.finish_authentication(result).await
    }

    /// Validate a raw access token, e.g. one read from the `accessToken` cookie.
    #[instrument(skip(self, token), fields(user_id = field::Empty))]
    pub async fn authenticate_token(
        &self,
        token: &str,
    ) -> std::result::Result<AuthContext, AuthError> {
        let result = if token.trim().is_empty() {
            Err(AuthError::MissingToken)
        } else {
            self.check_access_token(token.trim()).await
        };
        self.finish_authentication(result).await
    }

    /// Exchange a refresh token for a brand-new pair.
    ///
    /// The presented refresh token is not consumed; it stays valid until its
    /// own expiry.
    #[instrument(skip(self, header), fields(user_id = field::Empty))]
    pub async fn refresh(&self, header: &str) -> std::result::Result<TokenPair, AuthError> {
        let result = self.check_refresh(header).await;

        match &result {
            Ok(_) => {
                metrics::record_refresh("success").await;
                metrics::record_token_issued("access").await;
                metrics::record_token_issued("refresh").await;
            }
            Err(err) => {
                warn!(reason = err.reason(), "token refresh rejected");
                metrics::record_refresh(err.reason()).await;
            }
        }

        result
    }

    async fn check_access_token(&self, token: &str) -> std::result::Result<AuthContext, AuthError> {
        let claims = self.keys.verify_access(token)?;
        let user = self.load_active_user(&claims).await?;

        if claims.role != Some(user.role) {
            warn!(
                user_id = %user.id,
                token_role = ?claims.role,
                current_role = %user.role,
                "access token role no longer matches account"
            );
            return Err(AuthError::UserInactiveOrMissing);
        }

        Ok(AuthContext::new(user.id, user.username, user.email, user.role))
    }

    async fn check_refresh(&self, header: &str) -> std::result::Result<TokenPair, AuthError> {
        let token = bearer_token(header)?;
        let claims = self.keys.verify_refresh(token)?;
        let user = self.load_active_user(&claims).await?;

        let pair = self.keys.issue_pair(&user.id, user.role)?;
        info!(user_id = %user.id, "token pair refreshed");
        Ok(pair)
    }

    async fn load_active_user(&self, claims: &Claims) -> std::result::Result<User, AuthError> {
        let user_id = claims.user_id();
        tracing::Span::current().record("user_id", field::display(&user_id));

        match self.repository.get_user(&user_id).await? {
            Some(user) if user.is_active() => Ok(user),
            Some(_) | None => Err(AuthError::UserInactiveOrMissing),
        }
    }

    async fn finish_authentication(
        &self,
        result: std::result::Result<AuthContext, AuthError>,
    ) -> std::result::Result<AuthContext, AuthError> {
        match &result {
            Ok(_) => metrics::record_authentication("success").await,
            Err(err) => metrics::record_authentication(err.reason()).await,
        }
        result
    }
}
