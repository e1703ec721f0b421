//! Startup sequence for the back-office service
//!
//! Runs once after the pool is created and before the HTTP server binds:
//! seeds the configured bootstrap administrator and publishes initial pool
//! statistics.

use tracing::{info, warn};

use crate::auth::UserService;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::observability::metrics;
use crate::storage::{get_pool_stats, DbPool};

/// Print a notice when the bootstrap admin is created so operators know
/// which account to sign in with.
fn display_bootstrap_banner(email: &str, username: &str) {
    eprintln!();
    eprintln!("================================================================");
    eprintln!("  DYHE back-office: bootstrap administrator created");
    eprintln!("  email:    {}", email);
    eprintln!("  username: {}", username);
    eprintln!("  Change the password after the first sign-in.");
    eprintln!("================================================================");
    eprintln!();
}

/// Seed the bootstrap administrator if one is configured and absent.
pub async fn ensure_bootstrap_admin(pool: &DbPool, config: &AppConfig) -> Result<()> {
    if !config.bootstrap.is_configured() {
        info!("No bootstrap administrator configured");
        return Ok(());
    }

    let service = UserService::with_sqlx(pool.clone());
    match service.ensure_bootstrap_admin(&config.bootstrap).await? {
        Some(user) => {
            info!(user_id = %user.id, username = %user.username, "Bootstrap administrator created");
            display_bootstrap_banner(&user.email, &user.username);
        }
        None => info!("Bootstrap administrator already present"),
    }

    Ok(())
}

/// Run every startup task in order.
pub async fn run_startup_tasks(pool: &DbPool, config: &AppConfig) -> Result<()> {
    if let Err(e) = ensure_bootstrap_admin(pool, config).await {
        warn!(error = %e, "Failed to seed bootstrap administrator");
        return Err(e);
    }

    let stats = get_pool_stats(pool);
    metrics::update_db_connections(stats.active()).await;
    info!(size = stats.size, idle = stats.idle, "Database pool ready");

    Ok(())
}
