//! Client-side session guard.
//!
//! Decides whether a protected view may render. On mount it looks for a stored
//! access token; if there is one it verifies it with exactly one profile fetch.
//! Until that fetch resolves the guard neither renders nor redirects.
//!
//! With a [`TokenRefresher`] attached, an access token that has already expired
//! is exchanged for a new pair before the check. A failed refresh signs the
//! session out completely.
//!
//! ```text
//! Unmounted -> Checking -> Authenticated(profile)
//!     \            \-----> Unauthenticated
//!      \-------------------^ (no stored token)
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::auth::models::TokenPair;
use crate::auth::user::UserProfile;
use crate::client::cache::{Invalidation, QueryCache, QueryKey};
use crate::errors::{AuthErrorType, DyheError, Result};

/// Something that can resolve an access token into the caller's profile.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile>;
}

/// Something that can exchange a refresh token for a new pair.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_pair(&self, refresh_token: &str) -> Result<TokenPair>;
}

/// Where the client keeps its token pair (cookies in a browser).
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn access_token(&self) -> Option<String>;
    async fn refresh_token(&self) -> Option<String>;
    async fn store(&self, pair: &TokenPair);
    /// Remove both tokens.
    async fn clear(&self);
}

/// In-process [`TokenStore`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    pair: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: TokenPair) -> Self {
        Self { pair: RwLock::new(Some(pair)) }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn access_token(&self) -> Option<String> {
        self.pair
            .read()
            .await
            .as_ref()
            .map(|p| p.access_token.clone())
            .filter(|t| !t.is_empty())
    }

    async fn refresh_token(&self) -> Option<String> {
        self.pair
            .read()
            .await
            .as_ref()
            .map(|p| p.refresh_token.clone())
            .filter(|t| !t.is_empty())
    }

    async fn store(&self, pair: &TokenPair) {
        *self.pair.write().await = Some(pair.clone());
    }

    async fn clear(&self) {
        *self.pair.write().await = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unmounted,
    Checking,
    Authenticated(UserProfile),
    Unauthenticated,
}

/// Proof that a mount entered `Checking`; consumed by [`SessionGuard::check`].
#[derive(Debug)]
#[must_use = "a pending session check must be resolved with SessionGuard::check"]
pub struct CheckTicket {
    generation: u64,
    access_token: String,
}

#[derive(Debug)]
struct GuardState {
    state: SessionState,
    generation: u64,
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// True when the token's `exp` is in the past. The signature is not checked;
/// a token that cannot be read is left for the server to judge.
pub fn access_token_expired(token: &str) -> bool {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims.exp <= chrono::Utc::now().timestamp(),
        Err(_) => false,
    }
}

pub struct SessionGuard {
    profiles: Arc<dyn ProfileSource>,
    tokens: Arc<dyn TokenStore>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    cache: QueryCache,
    inner: Mutex<GuardState>,
}

impl SessionGuard {
    pub fn new(
        profiles: Arc<dyn ProfileSource>,
        tokens: Arc<dyn TokenStore>,
        cache: QueryCache,
    ) -> Self {
        Self {
            profiles,
            tokens,
            refresher: None,
            cache,
            inner: Mutex::new(GuardState { state: SessionState::Unmounted, generation: 0 }),
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Exchange the stored refresh token for a new pair and store it.
    ///
    /// Makes a single refresh call. On any failure both tokens and every
    /// cached query are dropped and the guard resolves to `Unauthenticated`.
    pub async fn refresh(&self) -> Result<TokenPair> {
        let refresher = self
            .refresher
            .as_ref()
            .ok_or_else(|| DyheError::internal("No token refresher configured"))?;

        let Some(refresh_token) = self.tokens.refresh_token().await else {
            debug!("no stored refresh token");
            self.sign_out().await;
            return Err(DyheError::auth("No refresh token stored", AuthErrorType::MissingToken));
        };

        match refresher.refresh_pair(&refresh_token).await {
            Ok(pair) => {
                self.tokens.store(&pair).await;
                info!("session tokens refreshed");
                Ok(pair)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, signing out");
                self.sign_out().await;
                Err(e)
            }
        }
    }

    /// Start a new mount.
    ///
    /// Without a stored access token the guard resolves to `Unauthenticated`
    /// immediately and no ticket is returned. An expired access token is
    /// refreshed first when a refresher is attached.
    pub async fn mount(&self) -> Option<CheckTicket> {
        let mut access_token = self.tokens.access_token().await;

        if self.refresher.is_some() && access_token.as_deref().is_some_and(access_token_expired) {
            debug!("stored access token has expired");
            access_token = self.refresh().await.ok().map(|pair| pair.access_token);
        }

        let mut inner = self.inner.lock().await;
        inner.generation += 1;

        match access_token {
            Some(access_token) => {
                inner.state = SessionState::Checking;
                Some(CheckTicket { generation: inner.generation, access_token })
            }
            None => {
                debug!("no stored access token");
                inner.state = SessionState::Unauthenticated;
                None
            }
        }
    }

    /// Resolve a pending check with a single profile fetch.
    ///
    /// A result arriving after its mount was unmounted (or re-mounted) is
    /// dropped and the current state is returned unchanged.
    pub async fn check(&self, ticket: CheckTicket) -> SessionState {
        let fetched = self.profiles.fetch_profile(&ticket.access_token).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != ticket.generation || inner.state != SessionState::Checking {
            debug!(
                ticket_generation = ticket.generation,
                current_generation = inner.generation,
                "ignoring stale session check"
            );
            return inner.state.clone();
        }

        inner.state = match fetched {
            Ok(profile) => {
                if let Err(e) = self.cache.set(QueryKey::profile(), &profile) {
                    warn!(error = %e, "failed to cache profile");
                }
                info!(user_id = %profile.id, "session verified");
                SessionState::Authenticated(profile)
            }
            Err(e) => {
                warn!(error = %e, "session check failed, clearing tokens");
                self.tokens.clear().await;
                self.cache.invalidate(&Invalidation::Exact(QueryKey::profile()));
                SessionState::Unauthenticated
            }
        };
        inner.state.clone()
    }

    /// Mount and, when a token is present, run the check.
    pub async fn mount_and_check(&self) -> SessionState {
        match self.mount().await {
            Some(ticket) => self.check(ticket).await,
            None => SessionState::Unauthenticated,
        }
    }

    /// Leave the view. Any in-flight check becomes stale.
    pub async fn unmount(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.state = SessionState::Unmounted;
    }

    /// Drop the session locally: both tokens and all cached queries.
    pub async fn sign_out(&self) {
        self.tokens.clear().await;
        self.cache.clear();

        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.state = SessionState::Unauthenticated;
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }

    pub async fn can_render_protected(&self) -> bool {
        matches!(self.inner.lock().await.state, SessionState::Authenticated(_))
    }

    pub async fn should_redirect_to_sign_in(&self) -> bool {
        matches!(self.inner.lock().await.state, SessionState::Unauthenticated)
    }
}
