//! User repository: the credential store.
//!
//! CRUD over the `users` table. Password hashes are only ever returned by the
//! `*_with_password` lookups used during authentication.

use crate::auth::role::Role;
use crate::auth::user::{Gender, NewUser, UpdateUser, User, UserStatus};
use crate::domain::UserId;
use crate::errors::{DyheError, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::instrument;

const USER_COLUMNS: &str =
    "id, username, name, email, phone, password_hash, role, status, gender, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Get a user by ID
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Get a user by (normalized) email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get a user by username
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get a user and password hash by email or username
    async fn get_user_with_password(&self, identifier: &str) -> Result<Option<(User, String)>>;

    /// Get a user and password hash by ID
    async fn get_user_with_password_by_id(&self, id: &UserId) -> Result<Option<(User, String)>>;

    /// Update a user's details
    async fn update_user(&self, id: &UserId, update: UpdateUser) -> Result<User>;

    /// Replace a user's password hash
    async fn update_password(&self, id: &UserId, password_hash: String) -> Result<()>;

    /// List users, newest first
    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>>;

    /// Count total users
    async fn count_users(&self) -> Result<i64>;
}

#[derive(Debug, Clone)]
pub struct SqlxUserRepository {
    pool: DbPool,
}

impl SqlxUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_user(&self, row: UserRow) -> Result<User> {
        let role = Role::from_str(&row.role)
            .map_err(|_| DyheError::validation(format!("Unknown user role '{}'", row.role)))?;
        let status = UserStatus::from_str(&row.status)
            .map_err(|_| DyheError::validation(format!("Unknown user status '{}'", row.status)))?;
        let gender = row
            .gender
            .as_deref()
            .map(Gender::from_str)
            .transpose()
            .map_err(|e| DyheError::validation(e.to_string()))?;

        Ok(User {
            id: UserId::from_string(row.id),
            username: row.username,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role,
            status,
            gender,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn row_to_user_with_password(&self, row: UserRow) -> Result<(User, String)> {
        let password_hash = row.password_hash.clone();
        Ok((self.row_to_user(row)?, password_hash))
    }

    async fn fetch_one_where(&self, clause: &str, value: &str, context: &str) -> Result<Option<UserRow>> {
        let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, clause);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| DyheError::database(err, context))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username), name = "db_create_user")]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, name, email, phone, password_hash, role, status, gender, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.name)
        .bind(User::normalize_email(&user.email))
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.gender.map(|g| g.as_str()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| DyheError::database(err, "Failed to create user"))?;

        self.get_user(&user.id)
            .await?
            .ok_or_else(|| DyheError::internal("User not found after creation"))
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_get_user")]
    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let row = self.fetch_one_where("id = $1", id.as_str(), "Failed to fetch user").await?;
        row.map(|r| self.row_to_user(r)).transpose()
    }

    #[instrument(skip(self), name = "db_get_user_by_email")]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = User::normalize_email(email);
        let row =
            self.fetch_one_where("email = $1", &email, "Failed to fetch user by email").await?;
        row.map(|r| self.row_to_user(r)).transpose()
    }

    #[instrument(skip(self), name = "db_get_user_by_username")]
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = self
            .fetch_one_where("username = $1", username, "Failed to fetch user by username")
            .await?;
        row.map(|r| self.row_to_user(r)).transpose()
    }

    #[instrument(skip(self, identifier), name = "db_get_user_with_password")]
    async fn get_user_with_password(&self, identifier: &str) -> Result<Option<(User, String)>> {
        let identifier = identifier.trim();
        let row = if identifier.contains('@') {
            let email = User::normalize_email(identifier);
            self.fetch_one_where("email = $1", &email, "Failed to fetch user with password")
                .await?
        } else {
            self.fetch_one_where("username = $1", identifier, "Failed to fetch user with password")
                .await?
        };

        row.map(|r| self.row_to_user_with_password(r)).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_get_user_with_password_by_id")]
    async fn get_user_with_password_by_id(&self, id: &UserId) -> Result<Option<(User, String)>> {
        let row = self
            .fetch_one_where("id = $1", id.as_str(), "Failed to fetch user with password")
            .await?;
        row.map(|r| self.row_to_user_with_password(r)).transpose()
    }

    #[instrument(skip(self, update), fields(user_id = %id), name = "db_update_user")]
    async fn update_user(&self, id: &UserId, update: UpdateUser) -> Result<User> {
        let current = self
            .get_user(id)
            .await?
            .ok_or_else(|| DyheError::not_found("User", id.to_string()))?;

        let username = update.username.unwrap_or(current.username);
        let name = update.name.unwrap_or(current.name);
        let email = update.email.map(|e| User::normalize_email(&e)).unwrap_or(current.email);
        let phone = update.phone.or(current.phone);
        let role = update.role.unwrap_or(current.role);
        let status = update.status.unwrap_or(current.status);
        let gender = update.gender.or(current.gender);

        sqlx::query(
            r#"
            UPDATE users
            SET username = $1, name = $2, email = $3, phone = $4, role = $5, status = $6, gender = $7, updated_at = $8
            WHERE id = $9
            "#,
        )
        .bind(&username)
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(role.as_str())
        .bind(status.as_str())
        .bind(gender.map(|g| g.as_str()))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| DyheError::database(err, "Failed to update user"))?;

        self.get_user(id)
            .await?
            .ok_or_else(|| DyheError::internal("User not found after update"))
    }

    #[instrument(skip(self, password_hash), fields(user_id = %id), name = "db_update_password")]
    async fn update_password(&self, id: &UserId, password_hash: String) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
            .bind(&password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| DyheError::database(err, "Failed to update password"))?;

        if result.rows_affected() == 0 {
            return Err(DyheError::not_found("User", id.to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self), fields(limit = limit, offset = offset), name = "db_list_users")]
    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, username ASC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| DyheError::database(err, "Failed to list users"))?;

        rows.into_iter().map(|r| self.row_to_user(r)).collect()
    }

    #[instrument(skip(self), name = "db_count_users")]
    async fn count_users(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| DyheError::database(err, "Failed to count users"))
    }
}
