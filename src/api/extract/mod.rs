//! Extractors for the request-scoped repository handles
//!
//! Each handle is looked up by its type in the request extensions, which
//! [`attach_repositories`](crate::api::middleware::attach_repositories)
//! populates. A missing extension means a route was mounted outside that
//! middleware, so extraction fails with a logged 500 instead of a silent
//! fallback.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use tracing::error;

use crate::api::middleware::RequestCancellation;
use crate::api::types::ApiError;
use crate::domain::{CacheHandle, RepositoryProvider, StorageHandle};

fn from_extensions<T>(parts: &Parts, name: &'static str) -> Result<T, ApiError>
where
    T: Clone + Send + Sync + 'static,
{
    parts.extensions.get::<T>().cloned().ok_or_else(|| {
        error!(
            extension = name,
            path = %parts.uri.path(),
            "Request extension missing; route is not behind the repository middleware"
        );
        ApiError::internal("Repositories are not available for this request")
    })
}

impl<S> FromRequestParts<S> for RepositoryProvider
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions(parts, "RepositoryProvider")
    }
}

impl<S> FromRequestParts<S> for StorageHandle
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions(parts, "StorageHandle")
    }
}

impl<S> FromRequestParts<S> for CacheHandle
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions(parts, "CacheHandle")
    }
}

impl<S> FromRequestParts<S> for RequestCancellation
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        from_extensions(parts, "RequestCancellation")
    }
}

/// Record identifier taken from the `{id}` path segment
///
/// Unlike a bare `Path<u64>`, a malformed id is rejected with the JSON error
/// envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub u64);

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<u64>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid record id: {}", e.body_text())))?;

        Ok(RecordId(id))
    }
}
