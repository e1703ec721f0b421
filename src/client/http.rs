//! HTTP client for the DYHE back-office API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

use crate::auth::models::{LoginResponse, TokenPair};
use crate::auth::user::UserProfile;
use crate::client::session::{ProfileSource, TokenRefresher};
use crate::errors::{DyheError, Result};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the API (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8080".to_string(), timeout: 30 }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody<'a> {
    identifier: &'a str,
    password: &'a str,
}

/// Thin typed wrapper over the auth endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| DyheError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("POST {}", url);
        self.client.post(url)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("GET {}", url);
        self.client.get(url)
    }

    /// `POST /api/v1/auth/login`
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginResponse> {
        let response = self
            .post("/api/v1/auth/login")
            .json(&LoginBody { identifier, password })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// `POST /api/v1/auth/refresh` with the refresh token as bearer.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let response =
            self.post("/api/v1/auth/refresh").bearer_auth(refresh_token).send().await?;
        self.handle_response(response).await
    }

    /// `POST /api/v1/auth/logout`
    pub async fn logout(&self) -> Result<()> {
        let response = self.post("/api/v1/auth/logout").send().await?;
        self.handle_empty(response).await
    }

    /// `GET /api/v1/auth/profile`
    pub async fn profile(&self, access_token: &str) -> Result<UserProfile> {
        let response = self.get("/api/v1/auth/profile").bearer_auth(access_token).send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(Self::error_from(status, response).await);
        }

        let body = response.text().await?;
        trace!("Response body:\n{}", body);

        serde_json::from_str(&body).map_err(|e| {
            DyheError::http(format!("Failed to deserialize response: {}", e), status.as_u16())
        })
    }

    async fn handle_empty(&self, response: Response) -> Result<()> {
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(Self::error_from(status, response).await);
        }
        Ok(())
    }

    async fn error_from(status: StatusCode, response: Response) -> DyheError {
        let text = response.text().await.unwrap_or_else(|_| "<unable to read error>".to_string());
        trace!("Error response:\n{}", text);

        let message = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => format!("{}: {}", body.error, body.message),
            Err(_) => text,
        };
        DyheError::http(message, status.as_u16())
    }
}

#[async_trait]
impl ProfileSource for ApiClient {
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile> {
        self.profile(access_token).await
    }
}

#[async_trait]
impl TokenRefresher for ApiClient {
    async fn refresh_pair(&self, refresh_token: &str) -> Result<TokenPair> {
        self.refresh(refresh_token).await
    }
}
