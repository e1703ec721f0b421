//! # HTTP Request Tracing Middleware
//!
//! Axum middleware that wraps every request in an `http_request` span and
//! records Prometheus request counters and latency.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Instrument;

use crate::observability::metrics;

/// Axum middleware that traces a request and records its metrics.
///
/// The span carries method, path and a request id; status and latency are
/// filled in once the inner service responds.
pub async fn trace_http_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().path().to_string();
    let start = Instant::now();

    let span = crate::request_span!(method, uri);
    let response = next.run(request).instrument(span.clone()).await;

    let status_code = response.status().as_u16();
    let elapsed = start.elapsed();

    span.record("status", status_code);
    span.record("latency_ms", elapsed.as_millis() as u64);

    span.in_scope(|| {
        if status_code >= 500 {
            tracing::error!(status = status_code, "request failed");
        } else {
            tracing::debug!(status = status_code, "request completed");
        }
    });

    metrics::record_http_request(
        &method,
        &normalize_path_for_metrics(&uri),
        status_code,
        elapsed.as_secs_f64(),
    )
    .await;

    response
}

/// Normalize path for metrics to avoid high cardinality
///
/// Replaces user ids and other dynamic segments with `:id`, and folds page
/// paths served by the static fallback into a single label.
pub(crate) fn normalize_path_for_metrics(path: &str) -> String {
    if !path.starts_with("/api/") && path != "/health" {
        return "/:page".to_string();
    }

    let segments: Vec<&str> = path.split('/').collect();
    let mut normalized = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            normalized.push(*segment);
            continue;
        }

        let is_uuid =
            segment.len() == 36 && segment.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
        let is_numeric = segment.chars().all(|c| c.is_ascii_digit());
        let prev_is_collection = i > 0 && matches!(segments.get(i - 1).copied(), Some("users"));

        if is_uuid || is_numeric || prev_is_collection {
            normalized.push(":id");
        } else {
            normalized.push(*segment);
        }
    }

    normalized.join("/")
}
