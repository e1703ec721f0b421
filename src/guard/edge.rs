//! Edge route guard.
//!
//! A cheap, pre-render check on the presence of the `accessToken` cookie. It
//! never verifies the token; the API middleware does that. Its only job is to
//! keep anonymous visitors off back-office pages and signed-in visitors off the
//! sign-in page.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::auth::models::ACCESS_TOKEN_COOKIE;
use crate::config::WebConfig;

/// Outcome of classifying a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Serve the request as-is.
    Pass,
    /// Protected page without a token; send to sign-in, remembering the target.
    RedirectToSignIn(String),
    /// Auth-only page with a token; send to the home page.
    RedirectHome(String),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    protected_prefixes: Vec<String>,
    sign_in_path: String,
    home_path: String,
}

impl RouteGuard {
    pub fn new<I, S>(protected_prefixes: I, sign_in_path: &str, home_path: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            protected_prefixes: protected_prefixes
                .into_iter()
                .map(|p| normalize_prefix(p.as_ref()))
                .filter(|p| p != "/")
                .collect(),
            sign_in_path: normalize_prefix(sign_in_path),
            home_path: home_path.to_string(),
        }
    }

    pub fn from_config(config: &WebConfig) -> Self {
        Self::new(&config.protected_prefixes, &config.sign_in_path, &config.home_path)
    }

    /// True when `path` is one of the protected prefixes or nested below one.
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|prefix| matches_segment_prefix(path, prefix))
    }

    /// True for pages only anonymous visitors should see: `/` and the sign-in page.
    pub fn is_auth_only(&self, path: &str) -> bool {
        path == "/" || matches_segment_prefix(path, &self.sign_in_path)
    }

    /// Classify a request target. `target` is a path with an optional query
    /// string; only the path is matched, the whole target is remembered.
    pub fn decide(&self, target: &str, has_token: bool) -> GuardDecision {
        let path = target.split_once('?').map_or(target, |(path, _)| path);

        if !has_token && self.is_protected(path) {
            return GuardDecision::RedirectToSignIn(format!(
                "{}?redirect={}",
                self.sign_in_path,
                encode_redirect_target(target)
            ));
        }

        if has_token && self.is_auth_only(path) {
            return GuardDecision::RedirectHome(self.home_path.clone());
        }

        GuardDecision::Pass
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// `/users` matches `/users` and `/users/42` but not `/usersettings`.
fn matches_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Query-encode a path, leaving `/` readable.
fn encode_redirect_target(path: &str) -> String {
    url::form_urlencoded::byte_serialize(path.as_bytes()).collect::<String>().replace("%2F", "/")
}

/// Axum middleware applying [`RouteGuard`] to every request.
pub async fn edge_guard(
    State(guard): State<Arc<RouteGuard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let has_token = CookieJar::from_headers(request.headers())
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| !cookie.value().trim().is_empty())
        .unwrap_or(false);

    let path = request.uri().path_and_query().map_or("/", |pq| pq.as_str());
    match guard.decide(path, has_token) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::RedirectToSignIn(location) => {
            debug!(path = %path, location = %location, "anonymous request to protected page");
            Redirect::temporary(&location).into_response()
        }
        GuardDecision::RedirectHome(location) => {
            debug!(path = %path, location = %location, "signed-in request to auth-only page");
            Redirect::temporary(&location).into_response()
        }
    }
}
