use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::support::{
    cookie_named, read_json, send_request, set_cookies, setup_test_app, ADMIN_EMAIL,
    ADMIN_PASSWORD,
};
use dyhe::auth::{user::UserStatus, Role};

#[tokio::test]
async fn bootstrap_admin_can_sign_in_by_email() {
    let app = setup_test_app().await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "identifier": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let body: Value = read_json(response).await;

    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(body["user"]["role"], "SUPER_ADMIN");
    assert_eq!(body["user"]["status"], "ACTIVE");
    assert!(body["user"].get("passwordHash").is_none());

    let access = cookie_named(&cookies, "accessToken").expect("access cookie");
    assert!(access.contains("Path=/"));
    assert!(access.contains("SameSite=Lax"));
    assert!(!access.contains("HttpOnly"));
    assert!(cookie_named(&cookies, "refreshToken").is_some());
}

#[tokio::test]
async fn identifier_matches_username_too() {
    let app = setup_test_app().await;
    let (access, refresh) = app.login("admin", ADMIN_PASSWORD).await;
    assert!(!access.is_empty());
    assert_ne!(access, refresh);
}

#[tokio::test]
async fn failures_are_indistinguishable() {
    let app = setup_test_app().await;
    let inactive = app.seed_user("inactive", "secret123", Role::Staff).await;
    app.users.set_status(&app.admin.id, &inactive.id, UserStatus::Inactive).await.unwrap();

    let mut bodies = Vec::new();
    for (identifier, password) in [
        (ADMIN_EMAIL, "wrong-password"),
        ("nobody@dyhe.com", "whatever"),
        ("inactive", "secret123"),
    ] {
        let response = send_request(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "identifier": identifier, "password": password })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", identifier);
        assert!(set_cookies(&response).is_empty());
        bodies.push(read_json::<Value>(response).await);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn empty_fields_are_rejected_before_lookup() {
    let app = setup_test_app().await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "identifier": "", "password": "" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
