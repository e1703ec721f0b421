#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use dyhe::{
    api::routes::{build_router, ApiState},
    auth::{
        hashing,
        user::{NewUser, User, UserStatus},
        JwtKeys, Role, UserService,
    },
    config::{AppConfig, DatabaseConfig},
    domain::UserId,
    storage::{create_pool, DbPool, SqlxUserRepository, UserRepository},
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@dyhe.com";
pub const ADMIN_PASSWORD: &str = "admin123";

pub struct TestApp {
    pub pool: DbPool,
    pub config: AppConfig,
    pub users: UserService,
    pub admin: User,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_router(ApiState::new(self.pool.clone(), &self.config), &self.config)
    }

    pub fn keys(&self) -> JwtKeys {
        JwtKeys::from_config(&self.config.auth)
    }

    pub async fn seed_user(&self, username: &str, password: &str, role: Role) -> User {
        SqlxUserRepository::new(self.pool.clone())
            .create_user(NewUser {
                id: UserId::new(),
                username: username.to_string(),
                name: username.to_string(),
                email: format!("{}@dyhe.com", username),
                phone: None,
                password_hash: hashing::prepare_credential(password).expect("hash password"),
                role,
                status: UserStatus::Active,
                gender: None,
            })
            .await
            .expect("seed user")
    }

    /// Log in through the API and return the token pair from the body.
    pub async fn login(&self, identifier: &str, password: &str) -> (String, String) {
        let response = send_request(
            self,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "identifier": identifier, "password": password })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "login as {} failed", identifier);

        let body: Value = read_json(response).await;
        (
            body["accessToken"].as_str().expect("accessToken").to_string(),
            body["refreshToken"].as_str().expect("refreshToken").to_string(),
        )
    }
}

pub async fn setup_test_app() -> TestApp {
    let config = AppConfig { database: DatabaseConfig::in_memory(), ..AppConfig::default() };
    let pool = create_pool(&config.database).await.expect("create in-memory pool");

    let users = UserService::with_sqlx(pool.clone());
    let admin = users
        .seed_admin(ADMIN_EMAIL, "admin", "Administrator", ADMIN_PASSWORD)
        .await
        .expect("seed admin")
        .expect("admin created");

    TestApp { pool, config, users, admin }
}

pub async fn send_request(
    app: &TestApp,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    send(app, builder, body).await
}

pub async fn send_with_cookie(
    app: &TestApp,
    method: Method,
    path: &str,
    cookie: &str,
    body: Option<Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(path).header(header::COOKIE, cookie);
    send(app, builder, body).await
}

async fn send(
    app: &TestApp,
    builder: axum::http::request::Builder,
    body: Option<Value>,
) -> Response<Body> {
    let request = if let Some(json) = body {
        let bytes = serde_json::to_vec(&json).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("build request")
    } else {
        builder.body(Body::empty()).expect("build request")
    };

    app.router().oneshot(request).await.expect("request")
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

/// `Set-Cookie` values on a response, in order.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().expect("cookie header").to_string())
        .collect()
}

pub fn cookie_named<'a>(cookies: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("{}=", name);
    cookies.iter().find(|c| c.starts_with(&prefix)).map(String::as_str)
}
