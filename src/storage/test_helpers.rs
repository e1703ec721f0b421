//! Test database utilities for in-library tests.
//!
//! Each `TestDatabase` is a private in-memory SQLite database with all
//! migrations applied, so tests are fully isolated from one another.
//!
//! This module is only available in test builds (`#[cfg(test)]`).

use crate::auth::hashing;
use crate::auth::role::Role;
use crate::auth::user::{NewUser, User, UserStatus};
use crate::config::DatabaseConfig;
use crate::domain::UserId;
use crate::storage::repositories::{SqlxUserRepository, UserRepository};
use crate::storage::{create_pool, DbPool};

pub struct TestDatabase {
    pub pool: DbPool,
}

impl TestDatabase {
    /// Create a new migrated in-memory database.
    pub async fn new() -> Self {
        let pool = create_pool(&DatabaseConfig::in_memory())
            .await
            .unwrap_or_else(|e| panic!("Failed to create in-memory test pool: {}", e));
        Self { pool }
    }

    /// Insert an account with a real Argon2 hash of `password`.
    pub async fn seed_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
        status: UserStatus,
    ) -> User {
        let repo = SqlxUserRepository::new(self.pool.clone());
        repo.create_user(NewUser {
            id: UserId::new(),
            username: username.to_string(),
            name: format!("{} (test)", username),
            email: email.to_string(),
            phone: None,
            password_hash: hashing::hash_password(password)
                .unwrap_or_else(|e| panic!("Failed to hash test password: {}", e)),
            role,
            status,
            gender: None,
        })
        .await
        .unwrap_or_else(|e| panic!("Failed to seed user '{}': {}", username, e))
    }
}
