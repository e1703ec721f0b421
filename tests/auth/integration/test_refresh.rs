use axum::http::{Method, StatusCode};
use serde_json::Value;

use crate::support::{
    cookie_named, read_json, send_request, send_with_cookie, set_cookies, setup_test_app,
    ADMIN_PASSWORD,
};
use dyhe::auth::{user::UserStatus, Role};

#[tokio::test]
async fn refresh_issues_pair_and_rewrites_cookies() {
    let app = setup_test_app().await;
    let (_, refresh) = app.login("admin", ADMIN_PASSWORD).await;

    let response =
        send_request(&app, Method::POST, "/api/v1/auth/refresh", Some(&refresh), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let pair: Value = read_json(response).await;
    let access = pair["accessToken"].as_str().unwrap();

    assert!(cookie_named(&cookies, "accessToken").unwrap().contains(access));
    assert!(cookie_named(&cookies, "refreshToken").is_some());

    let response =
        send_request(&app, Method::GET, "/api/v1/auth/profile", Some(access), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_reads_cookie_when_header_absent() {
    let app = setup_test_app().await;
    let (_, refresh) = app.login("admin", ADMIN_PASSWORD).await;

    let response = send_with_cookie(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        &format!("refreshToken={}", refresh),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_token_stays_usable_until_expiry() {
    let app = setup_test_app().await;
    let (_, refresh) = app.login("admin", ADMIN_PASSWORD).await;

    for _ in 0..2 {
        let response =
            send_request(&app, Method::POST, "/api/v1/auth/refresh", Some(&refresh), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn failed_refresh_clears_both_cookies() {
    let app = setup_test_app().await;
    let (access, _) = app.login("admin", ADMIN_PASSWORD).await;

    // An access token is not a refresh token.
    let response =
        send_request(&app, Method::POST, "/api/v1/auth/refresh", Some(&access), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookies = set_cookies(&response);
    for name in ["accessToken", "refreshToken"] {
        let cookie = cookie_named(&cookies, name).expect("cleared cookie");
        assert!(cookie.starts_with(&format!("{}=;", name)), "{}", cookie);
        assert!(cookie.contains("Max-Age=0"), "{}", cookie);
    }
}

#[tokio::test]
async fn refresh_rejected_for_deactivated_user() {
    let app = setup_test_app().await;
    let staff = app.seed_user("night-shift", "secret123", Role::Staff).await;
    let (_, refresh) = app.login("night-shift", "secret123").await;

    app.users.set_status(&app.admin.id, &staff.id, UserStatus::Inactive).await.unwrap();

    let response =
        send_request(&app, Method::POST, "/api/v1/auth/refresh", Some(&refresh), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_without_any_token_is_unauthorized() {
    let app = setup_test_app().await;
    let response = send_request(&app, Method::POST, "/api/v1/auth/refresh", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_expires_cookies() {
    let app = setup_test_app().await;

    let response = send_request(&app, Method::POST, "/api/v1/auth/logout", None, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookies = set_cookies(&response);
    assert!(cookie_named(&cookies, "accessToken").unwrap().contains("Max-Age=0"));
    assert!(cookie_named(&cookies, "refreshToken").unwrap().contains("Max-Age=0"));
}
