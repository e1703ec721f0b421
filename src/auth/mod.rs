//! Authentication and authorization module entry point.
//!
//! Credential hashing, the JWT issuer/validators, the login and refresh
//! services, account management, and the axum middleware that puts an
//! [`AuthContext`] on every authenticated request.

pub mod auth_service;
pub mod hashing;
pub mod jwt;
pub mod login_service;
pub mod middleware;
pub mod models;
pub mod role;
pub mod user;
pub mod user_service;

pub use auth_service::AuthService;
pub use jwt::{Claims, JwtKeys, TokenKind};
pub use login_service::LoginService;
pub use models::{AuthContext, AuthError, LoginResponse, TokenPair};
pub use role::{Capability, Role};
pub use user::{LoginRequest, User, UserProfile, UserStatus};
pub use user_service::UserService;
