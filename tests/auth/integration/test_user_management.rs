use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::support::{read_json, send_request, setup_test_app, ADMIN_PASSWORD};
use dyhe::auth::Role;

fn new_user(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "name": "Depot Staff",
        "email": email,
        "password": "secret123",
        "role": "STAFF"
    })
}

#[tokio::test]
async fn super_admin_creates_and_lists_users() {
    let app = setup_test_app().await;
    let (token, _) = app.login("admin", ADMIN_PASSWORD).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users",
        Some(&token),
        Some(new_user("depot", "Depot@DYHE.com")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = read_json(response).await;
    assert_eq!(created["email"], "depot@dyhe.com");
    assert_eq!(created["status"], "ACTIVE");
    assert!(created.get("passwordHash").is_none());

    let response =
        send_request(&app, Method::GET, "/api/v1/users?limit=500", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = read_json(response).await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["limit"], 100);
    assert_eq!(page["offset"], 0);
    assert_eq!(page["users"].as_array().unwrap().len(), 2);

    app.login("depot", "secret123").await;
}

#[tokio::test]
async fn duplicate_email_or_username_conflicts() {
    let app = setup_test_app().await;
    let (token, _) = app.login("admin", ADMIN_PASSWORD).await;

    for body in [new_user("admin", "other@dyhe.com"), new_user("someone", "ADMIN@dyhe.com")] {
        let response =
            send_request(&app, Method::POST, "/api/v1/users", Some(&token), Some(body)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = setup_test_app().await;
    let (token, _) = app.login("admin", ADMIN_PASSWORD).await;

    let mut body = new_user("shorty", "shorty@dyhe.com");
    body["password"] = json!("12345");
    let response = send_request(&app, Method::POST, "/api/v1/users", Some(&token), Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_super_admin_roles_are_forbidden() {
    let app = setup_test_app().await;
    app.seed_user("manager", "secret123", Role::Admin).await;
    let (token, _) = app.login("manager", "secret123").await;

    let response = send_request(&app, Method::GET, "/api/v1/users", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users",
        Some(&token),
        Some(new_user("sneaky", "sneaky@dyhe.com")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_cannot_deactivate_self() {
    let app = setup_test_app().await;
    let (token, _) = app.login("admin", ADMIN_PASSWORD).await;

    let response = send_request(
        &app,
        Method::PUT,
        &format!("/api/v1/users/{}/status", app.admin.id),
        Some(&token),
        Some(json!({ "status": "INACTIVE" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivate_then_reactivate_other_user() {
    let app = setup_test_app().await;
    let staff = app.seed_user("courier", "secret123", Role::Staff).await;
    let (token, _) = app.login("admin", ADMIN_PASSWORD).await;
    let path = format!("/api/v1/users/{}/status", staff.id);

    let response = send_request(
        &app,
        Method::PUT,
        &path,
        Some(&token),
        Some(json!({ "status": "INACTIVE" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["status"], "INACTIVE");

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "identifier": "courier", "password": "secret123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response =
        send_request(&app, Method::PUT, &path, Some(&token), Some(json!({ "status": "ACTIVE" })))
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    app.login("courier", "secret123").await;
}

#[tokio::test]
async fn reset_password_and_unknown_user() {
    let app = setup_test_app().await;
    let staff = app.seed_user("forgetful", "secret123", Role::Staff).await;
    let (token, _) = app.login("admin", ADMIN_PASSWORD).await;

    let response = send_request(
        &app,
        Method::PUT,
        &format!("/api/v1/users/{}/password", staff.id),
        Some(&token),
        Some(json!({ "newPassword": "fresh-secret" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    app.login("forgetful", "fresh-secret").await;

    let response = send_request(
        &app,
        Method::GET,
        "/api/v1/users/00000000-0000-4000-8000-000000000000",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response =
        send_request(&app, Method::GET, "/api/v1/users/not-a-uuid", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_user_changes_profile_fields() {
    let app = setup_test_app().await;
    let staff = app.seed_user("clerk", "secret123", Role::Staff).await;
    let (token, _) = app.login("admin", ADMIN_PASSWORD).await;

    let response = send_request(
        &app,
        Method::PATCH,
        &format!("/api/v1/users/{}", staff.id),
        Some(&token),
        Some(json!({ "name": "Head Clerk", "phone": "+255700000000" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["name"], "Head Clerk");
    assert_eq!(body["phone"], "+255700000000");
    assert_eq!(body["role"], "STAFF");
}
