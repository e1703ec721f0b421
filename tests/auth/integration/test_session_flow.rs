use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::support::{read_json, send_request, send_with_cookie, setup_test_app, ADMIN_PASSWORD};
use dyhe::auth::{
    jwt::{Claims, TokenKind},
    user::{UpdateUserRequest, UserStatus},
    JwtKeys, Role,
};

#[tokio::test]
async fn profile_accepts_bearer_header_and_cookie() {
    let app = setup_test_app().await;
    let (access, _) = app.login("admin", ADMIN_PASSWORD).await;

    let response =
        send_request(&app, Method::GET, "/api/v1/auth/profile", Some(&access), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile: Value = read_json(response).await;
    assert_eq!(profile["username"], "admin");

    let response = send_with_cookie(
        &app,
        Method::GET,
        "/api/v1/auth/profile",
        &format!("accessToken={}", access),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn deactivation_takes_effect_on_next_request() {
    let app = setup_test_app().await;
    let staff = app.seed_user("courier-desk", "secret123", Role::Staff).await;
    let (access, _) = app.login("courier-desk", "secret123").await;

    let response =
        send_request(&app, Method::GET, "/api/v1/auth/profile", Some(&access), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.users.set_status(&app.admin.id, &staff.id, UserStatus::Inactive).await.unwrap();

    let response =
        send_request(&app, Method::GET, "/api/v1/auth/profile", Some(&access), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_change_invalidates_outstanding_access_tokens() {
    let app = setup_test_app().await;
    let staff = app.seed_user("ops", "secret123", Role::Staff).await;
    let (access, _) = app.login("ops", "secret123").await;

    app.users
        .update_user(&staff.id, UpdateUserRequest { role: Some(Role::Admin), ..Default::default() })
        .await
        .unwrap();

    let response =
        send_request(&app, Method::GET, "/api/v1/auth/profile", Some(&access), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (fresh, _) = app.login("ops", "secret123").await;
    let response =
        send_request(&app, Method::GET, "/api/v1/auth/profile", Some(&fresh), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile: Value = read_json(response).await;
    assert_eq!(profile["role"], "ADMIN");
}

#[tokio::test]
async fn rejected_tokens_share_one_generic_body() {
    let app = setup_test_app().await;
    let (_, refresh) = app.login("admin", ADMIN_PASSWORD).await;

    let keys = app.keys();
    let mut expired =
        Claims::new(TokenKind::Access, &app.admin.id, Some(Role::SuperAdmin), Duration::ZERO);
    expired.exp -= 60;
    expired.iat -= 120;
    let expired = keys.sign(&expired).unwrap();

    let foreign = JwtKeys::new(
        b"some-other-access-secret-0000000000000000",
        b"some-other-refresh-secret-000000000000000",
        Duration::from_secs(60),
        Duration::from_secs(600),
    )
    .issue_pair(&app.admin.id, Role::SuperAdmin)
    .unwrap()
    .access_token;

    let mut bodies = Vec::new();
    for token in [expired.as_str(), foreign.as_str(), refresh.as_str(), "not-a-jwt"] {
        let response =
            send_request(&app, Method::GET, "/api/v1/auth/profile", Some(token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(read_json::<Value>(response).await);
    }

    let response = send_request(&app, Method::GET, "/api/v1/auth/profile", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    bodies.push(read_json::<Value>(response).await);

    let generic = json!({ "error": "unauthorized", "message": "Unauthorized" });
    assert!(bodies.iter().all(|body| body == &generic));
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let app = setup_test_app().await;
    app.seed_user("dispatch", "secret123", Role::Staff).await;
    let (access, _) = app.login("dispatch", "secret123").await;

    let response = send_request(
        &app,
        Method::PUT,
        "/api/v1/auth/profile/password",
        Some(&access),
        Some(json!({ "currentPassword": "wrong", "newPassword": "another-secret" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send_request(
        &app,
        Method::PUT,
        "/api/v1/auth/profile/password",
        Some(&access),
        Some(json!({ "currentPassword": "secret123", "newPassword": "another-secret" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    app.login("dispatch", "another-secret").await;
}
