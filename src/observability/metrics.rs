//! # Metrics Collection
//!
//! Prometheus metrics for HTTP traffic and the authentication lifecycle.

use crate::config::ObservabilityConfig;
use crate::errors::{DyheError, Result};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metrics recorder that tracks application metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Record an HTTP request
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration: f64) {
        let request_labels = [
            ("method", method.to_string()),
            ("path", path.to_string()),
            ("status", status.to_string()),
        ];
        counter!("http_requests_total", &request_labels).increment(1);
        histogram!("http_request_duration_seconds", "method" => method.to_string())
            .record(duration);
    }

    /// Record a login or access-token check outcome
    pub fn record_authentication(&self, status: &str) {
        counter!("auth_authentications_total", "status" => status.to_string()).increment(1);
    }

    /// Record a token handed out, by kind (`access` or `refresh`)
    pub fn record_token_issued(&self, kind: &str) {
        counter!("auth_tokens_issued_total", "kind" => kind.to_string()).increment(1);
    }

    /// Record a refresh-flow outcome
    pub fn record_refresh(&self, status: &str) {
        counter!("auth_refreshes_total", "status" => status.to_string()).increment(1);
    }

    /// Update the gauge of pooled database connections
    pub fn update_db_connections(&self, active: u32) {
        gauge!("db_connections_active").set(active as f64);
    }

    pub fn register_http_metrics(&self) {
        describe_counter!("http_requests_total", Unit::Count, "HTTP requests by method, path and status");
        describe_histogram!(
            "http_request_duration_seconds",
            Unit::Seconds,
            "HTTP request latency"
        );
        describe_gauge!("db_connections_active", Unit::Count, "Active database connections");
    }

    pub fn register_auth_metrics(&self) {
        describe_counter!(
            "auth_authentications_total",
            Unit::Count,
            "Authentication attempts grouped by outcome"
        );
        describe_counter!("auth_tokens_issued_total", Unit::Count, "Tokens issued by kind");
        describe_counter!("auth_refreshes_total", Unit::Count, "Refresh attempts grouped by outcome");

        const AUTH_STATUSES: &[&str] = &[
            "success",
            "missing_token",
            "token_malformed",
            "token_expired",
            "invalid_credentials",
            "user_inactive_or_missing",
            "persistence",
        ];
        for status in AUTH_STATUSES {
            counter!("auth_authentications_total", "status" => *status).absolute(0);
            counter!("auth_refreshes_total", "status" => *status).absolute(0);
        }
        for kind in ["access", "refresh"] {
            counter!("auth_tokens_issued_total", "kind" => kind).absolute(0);
        }
    }
}

/// Global metrics recorder instance
static METRICS: once_cell::sync::Lazy<Arc<RwLock<Option<MetricsRecorder>>>> =
    once_cell::sync::Lazy::new(|| Arc::new(RwLock::new(None)));

/// Initialize metrics collection and Prometheus exporter
pub async fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        DyheError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| DyheError::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    let recorder = MetricsRecorder::new();
    {
        let mut metrics = METRICS.write().await;
        *metrics = Some(recorder.clone());
    }

    recorder.register_http_metrics();
    recorder.register_auth_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}

/// Get the global metrics recorder
pub async fn get_metrics() -> Option<MetricsRecorder> {
    METRICS.read().await.clone()
}

pub async fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_http_request(method, path, status, duration);
    }
}

pub async fn record_authentication(status: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_authentication(status);
    }
}

pub async fn record_token_issued(kind: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_token_issued(kind);
    }
}

pub async fn record_refresh(status: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_refresh(status);
    }
}

pub async fn update_db_connections(active: u32) {
    if let Some(metrics) = get_metrics().await {
        metrics.update_db_connections(active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording_without_exporter() {
        let recorder = MetricsRecorder::new();

        recorder.record_http_request("GET", "/api/v1/users", 200, 0.123);
        recorder.record_http_request("POST", "/api/v1/auth/login", 401, 0.456);
        recorder.record_authentication("success");
        recorder.record_token_issued("access");
        recorder.record_refresh("token_expired");
        recorder.update_db_connections(3);
        recorder.register_http_metrics();
        recorder.register_auth_metrics();
    }

    #[tokio::test]
    async fn test_init_metrics_disabled() {
        let config = ObservabilityConfig { enable_metrics: false, ..Default::default() };

        assert!(init_metrics(&config).await.is_ok());
        // Global helpers are no-ops until a recorder is installed.
        record_authentication("success").await;
    }

    #[tokio::test]
    async fn test_init_metrics_no_port() {
        let config =
            ObservabilityConfig { enable_metrics: true, metrics_port: 0, ..Default::default() };

        assert!(init_metrics(&config).await.is_ok());
    }
}
