//! # Command Line Interface
//!
//! Runs the API server and provides database and account tooling.

pub mod session;

use std::path::PathBuf;

use crate::api::start_api_server;
use crate::auth::UserService;
use crate::config::{load_config, AppConfig};
use crate::observability::{init_observability, log_config_info};
use crate::startup::run_startup_tasks;
use crate::storage::{create_pool, run_migrations, validate_migrations, MigrationInfo};
use crate::{APP_NAME, VERSION};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "dyhe")]
#[command(about = "DYHE back-office authentication service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (YAML or TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL override
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind to
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Run pending database migrations
    Migrate,

    /// Database inspection commands
    Database {
        #[command(subcommand)]
        command: DatabaseCommands,
    },

    /// Create a SUPER_ADMIN account unless the email is already registered
    SeedAdmin {
        #[arg(long)]
        email: String,

        #[arg(long, default_value = "admin")]
        username: String,

        #[arg(long, default_value = "Administrator")]
        name: String,

        #[arg(long)]
        password: String,
    },

    /// Talk to a running server as a client
    Session {
        #[command(subcommand)]
        command: session::SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum DatabaseCommands {
    /// Show migration status
    Status,

    /// List all applied migrations
    List,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }

    match cli.command {
        Commands::Serve { port, addr } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(addr) = addr {
                config.server.host = addr;
            }
            config.validate().context("invalid configuration")?;
            serve(config).await?
        }
        Commands::Migrate => {
            init_cli_logging(&config);
            migrate(&config).await?
        }
        Commands::Database { command } => {
            init_cli_logging(&config);
            handle_database_command(command, &config).await?
        }
        Commands::SeedAdmin { email, username, name, password } => {
            init_cli_logging(&config);
            seed_admin(&config, &email, &username, &name, &password).await?
        }
        Commands::Session { command } => {
            init_cli_logging(&config);
            session::handle_session_command(command).await?
        }
    }

    Ok(())
}

fn init_cli_logging(config: &AppConfig) {
    let mut observability = config.observability.clone();
    observability.enable_metrics = false;
    // A subscriber may already be installed (integration tests); ignore.
    let _ = crate::observability::init_logging(&observability);
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    init_observability(&config.observability).await.context("failed to initialise observability")?;

    info!(app_name = APP_NAME, version = VERSION, "Starting DYHE back-office service");
    log_config_info(&config);

    let pool = create_pool(&config.database).await?;
    if !config.database.auto_migrate {
        run_migrations(&pool).await?;
    }
    run_startup_tasks(&pool, &config).await?;

    start_api_server(&config, pool).await?;
    Ok(())
}

async fn seed_admin(
    config: &AppConfig,
    email: &str,
    username: &str,
    name: &str,
    password: &str,
) -> anyhow::Result<()> {
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;

    let service = UserService::with_sqlx(pool);
    match service.seed_admin(email, username, name, password).await? {
        Some(user) => println!("Created SUPER_ADMIN {} <{}> ({})", user.username, user.email, user.id),
        None => println!("An account with email {} already exists; nothing to do", email),
    }
    Ok(())
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let mut database = config.database.clone();
    database.auto_migrate = false;
    let pool = create_pool(&database).await?;

    println!("Running database migrations...");
    run_migrations(&pool).await?;
    println!("Migrations completed successfully!");
    Ok(())
}

/// Handle database inspection commands
async fn handle_database_command(
    command: DatabaseCommands,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let mut database = config.database.clone();
    database.auto_migrate = false;
    let pool = create_pool(&database).await?;

    match command {
        DatabaseCommands::Status => {
            if validate_migrations(&pool).await? {
                println!("Database schema is up to date");
            } else {
                println!("Database schema has pending migrations");
                std::process::exit(1);
            }
        }

        DatabaseCommands::List => {
            let migrations = crate::storage::list_applied_migrations(&pool).await?;
            if migrations.is_empty() {
                println!("No migrations have been applied");
            } else {
                println!("Applied migrations:");
                print_migrations_table(&migrations);
            }
        }
    }

    Ok(())
}

/// Print migrations in a formatted table
fn print_migrations_table(migrations: &[MigrationInfo]) {
    println!();
    println!("{:<15} {:<50} {:<25} {:<10}", "Version", "Description", "Applied On", "Time (ms)");
    println!("{}", "-".repeat(100));

    for migration in migrations {
        println!(
            "{:<15} {:<50} {:<25} {:<10}",
            migration.version,
            truncate_string(&migration.description, 48),
            migration.installed_on.format("%Y-%m-%d %H:%M:%S"),
            migration.execution_time
        );
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
