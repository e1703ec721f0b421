//! # Configuration Settings
//!
//! Defines the configuration structure for the DYHE back-office service.

use crate::errors::{DyheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Authentication configuration
    #[validate(nested)]
    pub auth: AuthConfig,

    /// Page routing and static assets
    #[validate(nested)]
    pub web: WebConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    /// Initial super-admin account
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(DyheError::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        if self.observability.enable_metrics && self.server.port == self.observability.metrics_port
        {
            return Err(DyheError::validation("Server and metrics ports cannot be the same"));
        }

        if !self.database.is_sqlite() {
            return Err(DyheError::validation_field(
                "Database URL must start with 'sqlite:'",
                "database.url",
            ));
        }

        if self.auth.access_token_secret.len() < 32 {
            return Err(DyheError::validation_field(
                "Access token secret must be at least 32 characters long",
                "auth.access_token_secret",
            ));
        }

        if self.auth.refresh_token_secret.len() < 32 {
            return Err(DyheError::validation_field(
                "Refresh token secret must be at least 32 characters long",
                "auth.refresh_token_secret",
            ));
        }

        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(DyheError::validation(
                "Access and refresh token secrets must be different",
            ));
        }

        if self.auth.access_token_ttl_seconds >= self.auth.refresh_token_ttl_seconds {
            return Err(DyheError::validation(
                "Access token lifetime must be shorter than refresh token lifetime",
            ));
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Enable CORS
    pub enable_cors: bool,

    /// CORS allowed origins (empty = allow all)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080, enable_cors: true, cors_origins: vec![] }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(min = 0, max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Run pending migrations on startup
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/dyhe.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600, // 10 minutes
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// In-memory databases live only as long as their connection.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            idle_timeout_seconds: 0,
            ..Default::default()
        }
    }
}

/// Token signing and cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret for access tokens
    #[validate(length(min = 1, message = "Access token secret cannot be empty"))]
    pub access_token_secret: String,

    /// HS256 secret for refresh tokens; must differ from the access secret
    #[validate(length(min = 1, message = "Refresh token secret cannot be empty"))]
    pub refresh_token_secret: String,

    /// Access token lifetime in seconds
    #[validate(range(
        min = 60,
        max = 86400,
        message = "Access token lifetime must be between 1 minute and 24 hours"
    ))]
    pub access_token_ttl_seconds: u64,

    /// Refresh token lifetime in seconds
    #[validate(range(
        min = 3600,
        max = 7776000,
        message = "Refresh token lifetime must be between 1 hour and 90 days"
    ))]
    pub refresh_token_ttl_seconds: u64,

    /// Max-Age of the `accessToken` cookie
    pub access_cookie_max_age_seconds: i64,

    /// Max-Age of the `refreshToken` cookie
    pub refresh_cookie_max_age_seconds: i64,

    /// Mark auth cookies `Secure`
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: "dyhe-access-secret-change-me-in-production-0001".to_string(),
            refresh_token_secret: "dyhe-refresh-secret-change-me-in-production-0002".to_string(),
            access_token_ttl_seconds: 3600,                 // 1 hour
            refresh_token_ttl_seconds: 7 * 24 * 3600,       // 7 days
            access_cookie_max_age_seconds: 7 * 24 * 3600,   // 7 days
            refresh_cookie_max_age_seconds: 30 * 24 * 3600, // 30 days
            secure_cookies: false,
        }
    }
}

impl AuthConfig {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_seconds)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_seconds)
    }
}

/// Page routing configuration for the edge guard and static assets
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WebConfig {
    /// Path prefixes that require an access token cookie
    pub protected_prefixes: Vec<String>,

    /// Sign-in page; unauthenticated visitors are sent here
    #[validate(length(min = 1, message = "Sign-in path cannot be empty"))]
    pub sign_in_path: String,

    /// Landing page for authenticated visitors hitting auth-only pages
    #[validate(length(min = 1, message = "Home path cannot be empty"))]
    pub home_path: String,

    /// Directory with the compiled front-end (None = no static serving)
    pub static_dir: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: [
                "/dashboard",
                "/users",
                "/drivers",
                "/merchants",
                "/packages",
                "/settings",
                "/profile",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            sign_in_path: "/sign-in".to_string(),
            home_path: "/dashboard".to_string(),
            static_dir: None,
        }
    }
}

/// Observability configuration for metrics and logging
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,

    /// Service name attached to log records
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            metrics_port: 9090,
            service_name: "dyhe".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if !self.enable_metrics || self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}

/// Super-admin created on startup when no account with that email exists
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_email: Option<String>,
    pub admin_username: Option<String>,
    pub admin_name: Option<String>,
    pub admin_password: Option<String>,
}

impl BootstrapConfig {
    pub fn is_configured(&self) -> bool {
        self.admin_email.is_some() && self.admin_password.is_some()
    }
}
