use std::sync::Arc;

use anyhow::bail;
use clap::{Args, Subcommand};

use crate::auth::models::TokenPair;
use crate::client::{
    ApiClient, ClientConfig, MemoryTokenStore, QueryCache, SessionGuard, SessionState, TokenStore,
};

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Base URL of the running service
    #[arg(long, default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Sign in and print the resulting profile and tokens
    Login {
        #[command(flatten)]
        server: ServerArgs,

        /// Email or username
        #[arg(long)]
        identifier: String,

        #[arg(long)]
        password: String,
    },

    /// Check whether an access token still grants a session
    Check {
        #[command(flatten)]
        server: ServerArgs,

        #[arg(long)]
        access_token: String,

        /// Refresh token used when the access token has expired
        #[arg(long)]
        refresh_token: Option<String>,
    },

    /// Exchange a refresh token for a new pair
    Refresh {
        #[command(flatten)]
        server: ServerArgs,

        #[arg(long)]
        refresh_token: String,
    },
}

fn client_for(server: &ServerArgs) -> anyhow::Result<ApiClient> {
    Ok(ApiClient::new(ClientConfig { base_url: server.base_url.clone(), timeout: server.timeout })?)
}

fn print_pair(pair: &TokenPair) {
    println!("accessToken:  {}", pair.access_token);
    println!("refreshToken: {}", pair.refresh_token);
}

pub async fn handle_session_command(command: SessionCommands) -> anyhow::Result<()> {
    match command {
        SessionCommands::Login { server, identifier, password } => {
            let client = client_for(&server)?;
            let response = client.login(&identifier, &password).await?;
            println!(
                "Signed in as {} <{}> ({})",
                response.user.username, response.user.email, response.user.role
            );
            print_pair(&response.tokens());
        }

        SessionCommands::Check { server, access_token, refresh_token } => {
            let client = Arc::new(client_for(&server)?);
            let tokens = Arc::new(MemoryTokenStore::with_pair(TokenPair {
                access_token,
                refresh_token: refresh_token.unwrap_or_default(),
            }));
            let guard = SessionGuard::new(client.clone(), tokens.clone(), QueryCache::new())
                .with_refresher(client);

            match guard.mount_and_check().await {
                SessionState::Authenticated(profile) => {
                    println!("Authenticated as {} ({})", profile.username, profile.role);
                    if let (Some(access), Some(refresh)) =
                        (tokens.access_token().await, tokens.refresh_token().await)
                    {
                        print_pair(&TokenPair { access_token: access, refresh_token: refresh });
                    }
                }
                state => bail!("session not established: {:?}", state),
            }
        }

        SessionCommands::Refresh { server, refresh_token } => {
            let client = client_for(&server)?;
            let pair = client.refresh(&refresh_token).await?;
            print_pair(&pair);
        }
    }

    Ok(())
}
