//! User management service for administrator and self-service operations.
//!
//! Every path that sets a password goes through
//! [`hashing::prepare_credential`].

use std::sync::Arc;

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::hashing;
use crate::auth::role::Role;
use crate::auth::user::{
    CreateUserRequest, NewUser, UpdateUser, UpdateUserRequest, User, UserStatus,
};
use crate::config::BootstrapConfig;
use crate::domain::UserId;
use crate::errors::{AuthErrorType, Error, Result};
use crate::storage::repositories::{SqlxUserRepository, UserRepository};

/// Largest page `list_users` will return.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Service for managing back-office accounts.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    pub fn with_sqlx(pool: crate::storage::DbPool) -> Self {
        Self::new(Arc::new(SqlxUserRepository::new(pool)))
    }

    /// Create a new account.
    ///
    /// Duplicate email or username is reported as a conflict, both from the
    /// pre-check and from the database constraint if two creates race.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        request.validate()?;

        let email = User::normalize_email(&request.email);
        self.ensure_unique(&email, &request.username, None).await?;

        let password_hash = hashing::prepare_credential(&request.password)?;

        let new_user = NewUser {
            id: UserId::new(),
            username: request.username,
            name: request.name,
            email,
            phone: request.phone,
            password_hash,
            role: request.role,
            status: UserStatus::Active,
            gender: request.gender,
        };

        let user = self.user_repository.create_user(new_user).await.map_err(conflict_on_unique)?;

        info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &UserId) -> Result<User> {
        self.user_repository
            .get_user(id)
            .await?
            .ok_or_else(|| Error::not_found("User", id.as_str()))
    }

    /// List users with pagination, returning the page and the total count.
    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = offset.max(0);

        let users = self.user_repository.list_users(limit, offset).await?;
        let total = self.user_repository.count_users().await?;
        Ok((users, total))
    }

    /// Update a user's details.
    ///
    /// Only fields present in the request are modified.
    #[instrument(skip(self, request), fields(user_id = %id))]
    pub async fn update_user(&self, id: &UserId, request: UpdateUserRequest) -> Result<User> {
        request.validate()?;

        let existing = self.get_user(id).await?;
        let update: UpdateUser = request.into();

        let email = update.email.as_deref().filter(|email| *email != existing.email);
        let username =
            update.username.as_deref().filter(|username| *username != existing.username);
        self.ensure_unique_opt(email, username, Some(id)).await?;

        let user = self.user_repository.update_user(id, update).await.map_err(conflict_on_unique)?;
        info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    /// Activate or deactivate an account.
    ///
    /// An administrator cannot deactivate their own account. Deactivation
    /// takes effect on the next request that presents one of the user's tokens.
    #[instrument(skip(self), fields(actor = %actor, user_id = %id, status = %status))]
    pub async fn set_status(&self, actor: &UserId, id: &UserId, status: UserStatus) -> Result<User> {
        if actor == id && status == UserStatus::Inactive {
            return Err(Error::validation_field("You cannot deactivate your own account", "status"));
        }

        self.get_user(id).await?;
        let user = self
            .user_repository
            .update_user(id, UpdateUser { status: Some(status), ..Default::default() })
            .await?;

        info!(user_id = %user.id, status = %user.status, "user status changed");
        Ok(user)
    }

    /// Administrator-initiated password reset.
    #[instrument(skip(self, new_password), fields(user_id = %id))]
    pub async fn reset_password(&self, id: &UserId, new_password: &str) -> Result<()> {
        self.get_user(id).await?;
        let password_hash = hashing::prepare_credential(new_password)?;
        self.user_repository.update_password(id, password_hash).await?;

        info!(user_id = %id, "password reset by administrator");
        Ok(())
    }

    /// Self-service password change; the current password must be supplied.
    #[instrument(skip(self, current_password, new_password), fields(user_id = %id))]
    pub async fn change_password(
        &self,
        id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let (_, stored_hash) = self
            .user_repository
            .get_user_with_password_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("User", id.as_str()))?;

        if !hashing::verify_password(current_password, &stored_hash)? {
            warn!(user_id = %id, "password change with incorrect current password");
            return Err(Error::auth(
                "Current password is incorrect",
                AuthErrorType::InvalidCredentials,
            ));
        }

        let password_hash = hashing::prepare_credential(new_password)?;
        self.user_repository.update_password(id, password_hash).await?;

        info!(user_id = %id, "password changed");
        Ok(())
    }

    /// Create a super-admin unless an account with that email already exists.
    ///
    /// Returns the new user, or `None` when the email is already taken.
    #[instrument(skip(self, password), fields(email = %email, username = %username))]
    pub async fn seed_admin(
        &self,
        email: &str,
        username: &str,
        name: &str,
        password: &str,
    ) -> Result<Option<User>> {
        let email = User::normalize_email(email);
        if self.user_repository.get_user_by_email(&email).await?.is_some() {
            info!("admin account already present, skipping seed");
            return Ok(None);
        }

        let user = self
            .create_user(CreateUserRequest {
                username: username.to_string(),
                name: name.to_string(),
                email,
                phone: None,
                password: password.to_string(),
                role: Role::SuperAdmin,
                gender: None,
            })
            .await?;

        Ok(Some(user))
    }

    /// Apply the configured bootstrap admin, if any.
    pub async fn ensure_bootstrap_admin(&self, config: &BootstrapConfig) -> Result<Option<User>> {
        let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
            return Ok(None);
        };

        let username = config.admin_username.as_deref().unwrap_or("admin");
        let name = config.admin_name.as_deref().unwrap_or("Administrator");
        self.seed_admin(email, username, name, password).await
    }

    async fn ensure_unique(
        &self,
        email: &str,
        username: &str,
        current: Option<&UserId>,
    ) -> Result<()> {
        self.ensure_unique_opt(Some(email), Some(username), current).await
    }

    async fn ensure_unique_opt(
        &self,
        email: Option<&str>,
        username: Option<&str>,
        current: Option<&UserId>,
    ) -> Result<()> {
        let is_other = |user: &User| current.map_or(true, |id| &user.id != id);

        if let Some(email) = email {
            if let Some(other) = self.user_repository.get_user_by_email(email).await? {
                if is_other(&other) {
                    return Err(Error::conflict(
                        format!("Email '{}' is already in use", email),
                        "user",
                    ));
                }
            }
        }

        if let Some(username) = username {
            if let Some(other) = self.user_repository.get_user_by_username(username).await? {
                if is_other(&other) {
                    return Err(Error::conflict(
                        format!("Username '{}' is already in use", username),
                        "user",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn conflict_on_unique(err: Error) -> Error {
    if err.is_unique_violation() {
        Error::conflict("Email or username is already in use", "user")
    } else {
        err
    }
}
