//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::middleware::RequestCancellation;
use crate::domain::{CacheHandle, DomainError, StorageHandle};

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl HealthCheck {
    fn from_result(name: &str, result: Result<(), DomainError>, start: Instant) -> Self {
        let latency_ms = Some(start.elapsed().as_millis() as u64);
        match result {
            Ok(()) => Self {
                name: name.to_string(),
                status: HealthStatus::Healthy,
                message: None,
                latency_ms,
            },
            Err(e) => Self {
                name: name.to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(e.to_string()),
                latency_ms,
            },
        }
    }
}

/// Simple health check - returns 200 with the running version
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check that pings both backends
pub async fn ready_check(
    StorageHandle(storage): StorageHandle,
    CacheHandle(cache): CacheHandle,
    RequestCancellation(cancel): RequestCancellation,
) -> impl IntoResponse {
    let start = Instant::now();

    let (storage_check, cache_check) = tokio::join!(
        ping("storage", storage.ping(&cancel)),
        ping("cache", cache.ping(&cancel)),
    );
    let checks = vec![storage_check, cache_check];
    let overall_status = overall_status(&checks);

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check - simple check to verify the service is running
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn ping<F>(name: &str, probe: F) -> HealthCheck
where
    F: std::future::Future<Output = Result<(), DomainError>>,
{
    let start = Instant::now();
    HealthCheck::from_result(name, probe.await, start)
}

/// Storage is required to serve anything; a cache outage only degrades reads.
fn overall_status(checks: &[HealthCheck]) -> HealthStatus {
    let failed = |name: &str| {
        checks
            .iter()
            .any(|c| c.name == name && c.status != HealthStatus::Healthy)
    };

    if failed("storage") {
        HealthStatus::Unhealthy
    } else if failed("cache") {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
