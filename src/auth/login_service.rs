//! Login service: exchanges a username/email and password for a token pair.

use std::sync::{Arc, LazyLock};

use tracing::{error, info, instrument, warn};

use crate::auth::hashing;
use crate::auth::jwt::JwtKeys;
use crate::auth::models::{AuthError, LoginResponse};
use crate::auth::user::LoginRequest;
use crate::observability::metrics;
use crate::storage::repositories::{SqlxUserRepository, UserRepository};

/// Pre-computed dummy hash for timing-safe user enumeration prevention.
/// When an unknown identifier is used, we still run Argon2 verification against
/// this hash so the response time matches real verification.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hashing::hash_password("dummy_startup_value")
        .unwrap_or_else(|_| "$argon2id$v=19$m=768,t=1,p=1$dW5rbm93bg$dW5rbm93bg".to_string())
});

/// Service for handling identifier/password authentication.
#[derive(Clone)]
pub struct LoginService {
    user_repository: Arc<dyn UserRepository>,
    keys: Arc<JwtKeys>,
}

impl LoginService {
    pub fn new(user_repository: Arc<dyn UserRepository>, keys: Arc<JwtKeys>) -> Self {
        Self { user_repository, keys }
    }

    pub fn with_sqlx(pool: crate::storage::DbPool, keys: Arc<JwtKeys>) -> Self {
        Self::new(Arc::new(SqlxUserRepository::new(pool)), keys)
    }

    /// Authenticate a user and issue a fresh token pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when no user matches the
    /// identifier, the password is wrong, or the account is not active. The
    /// three cases are not distinguished to the caller. Performs no writes.
    #[instrument(skip(self, request), fields(identifier = %request.identifier))]
    pub async fn login(
        &self,
        request: &LoginRequest,
    ) -> std::result::Result<LoginResponse, AuthError> {
        let found = self.user_repository.get_user_with_password(&request.identifier).await?;

        let (user, password_hash) = match found {
            Some(found) => found,
            None => {
                if let Err(e) = hashing::verify_password(&request.password, &DUMMY_HASH) {
                    warn!(error = %e, "dummy hash verification failed unexpectedly");
                }
                warn!("login attempt for unknown identifier");
                metrics::record_authentication("invalid_credentials").await;
                return Err(AuthError::InvalidCredentials);
            }
        };

        let verified = hashing::verify_password(&request.password, &password_hash)
            .unwrap_or_else(|e| {
                error!(user_id = %user.id, error = %e, "stored password hash is unusable");
                false
            });
        if !verified {
            warn!(user_id = %user.id, "login attempt with incorrect password");
            metrics::record_authentication("invalid_credentials").await;
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active() {
            warn!(user_id = %user.id, status = %user.status, "login attempt for inactive user");
            metrics::record_authentication("invalid_credentials").await;
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.keys.issue_pair(&user.id, user.role)?;
        metrics::record_authentication("success").await;
        metrics::record_token_issued("access").await;
        metrics::record_token_issued("refresh").await;

        info!(user_id = %user.id, role = %user.role, "user logged in");

        Ok(LoginResponse::new(pair, user.into()))
    }
}
