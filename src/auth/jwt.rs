//! JWT issuance and verification for access and refresh tokens.
//!
//! Both kinds are HS256 and carry a `typ` claim; they are signed with
//! different secrets so one can never verify as the other.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::models::{AuthError, TokenPair};
use crate::auth::role::Role;
use crate::config::AuthConfig;
use crate::domain::UserId;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Role at issuance; access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(kind: TokenKind, user_id: &UserId, role: Option<Role>, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            role,
            typ: kind,
            iat: now,
            exp: now + ttl.as_secs() as i64,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId::from_string(self.sub.clone())
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KeyPair {
    fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

/// Signing keys and lifetimes for both token kinds.
pub struct JwtKeys {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            access: KeyPair::new(access_secret, access_ttl),
            refresh: KeyPair::new(refresh_secret, refresh_ttl),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.access_token_secret.as_bytes(),
            config.refresh_token_secret.as_bytes(),
            config.access_token_ttl(),
            config.refresh_token_ttl(),
        )
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Sign arbitrary claims with the key matching `claims.typ`.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys(claims.typ).encoding).map_err(
            |err| Error::internal(format!("Failed to sign {} token: {}", claims.typ.as_str(), err)),
        )
    }

    /// Issue a fresh access/refresh pair for a user.
    pub fn issue_pair(&self, user_id: &UserId, role: Role) -> Result<TokenPair> {
        let access = Claims::new(TokenKind::Access, user_id, Some(role), self.access.ttl);
        let refresh = Claims::new(TokenKind::Refresh, user_id, None, self.refresh.ttl);

        Ok(TokenPair { access_token: self.sign(&access)?, refresh_token: self.sign(&refresh)? })
    }

    /// Verify signature, expiry and `typ` of a token of the expected kind.
    ///
    /// Signature is always checked before expiry, so a forged token reports
    /// `TokenMalformed` even when its `exp` is in the past.
    pub fn verify(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> std::result::Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.keys(expected).decoding, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenMalformed,
            })?;

        let claims = data.claims;
        if claims.typ != expected {
            return Err(AuthError::TokenMalformed);
        }
        if expected == TokenKind::Access && claims.role.is_none() {
            return Err(AuthError::TokenMalformed);
        }

        Ok(claims)
    }

    pub fn verify_access(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        self.verify(token, TokenKind::Refresh)
    }
}
