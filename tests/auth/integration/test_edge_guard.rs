use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use tower::ServiceExt;

use crate::support::{send_request, send_with_cookie, setup_test_app};

#[tokio::test]
async fn anonymous_page_request_redirects_to_sign_in() {
    let app = setup_test_app().await;

    let response = send_request(&app, Method::GET, "/users/42", None, None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/sign-in?redirect=/users/42");
}

#[tokio::test]
async fn signed_in_visitor_skips_sign_in_page() {
    let app = setup_test_app().await;

    for path in ["/", "/sign-in"] {
        let response = send_with_cookie(&app, Method::GET, path, "accessToken=abc", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/dashboard");
    }
}

#[tokio::test]
async fn cookie_presence_is_enough_for_pages() {
    let app = setup_test_app().await;

    // The edge only checks that a cookie exists; the API validates it.
    let response =
        send_with_cookie(&app, Method::GET, "/dashboard", "accessToken=expired-or-forged", None)
            .await;
    assert_ne!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let response = send_with_cookie(&app, Method::GET, "/dashboard", "accessToken=", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn api_paths_are_not_redirected() {
    let app = setup_test_app().await;

    let response = send_request(&app, Method::GET, "/api/v1/users", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send_request(&app, Method::GET, "/usersettings", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_front_end_is_served_behind_the_guard() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("dashboard")).unwrap();
    std::fs::write(dir.path().join("dashboard/index.html"), "<h1>dashboard</h1>").unwrap();

    let mut app = setup_test_app().await;
    app.config.web.static_dir = Some(dir.path().to_string_lossy().into_owned());

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/dashboard/index.html")
                .header(header::COOKIE, "accessToken=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<h1>dashboard</h1>");

    let response = app
        .router()
        .oneshot(Request::builder().uri("/dashboard/index.html").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}
