//! Record endpoints

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::extract::RecordId;
use super::middleware::RequestCancellation;
use super::state::AppState;
use super::types::{ApiError, InsertRecordRequest};
use crate::domain::{Record, RepositoryProvider};
use crate::infrastructure::services::RecordService;

fn service(provider: RepositoryProvider, state: &AppState) -> RecordService {
    RecordService::new(
        provider,
        state.retry.clone(),
        Arc::clone(&state.invalidation),
    )
}

/// `GET /` - the serialized record list
pub async fn list_records(
    State(state): State<AppState>,
    provider: RepositoryProvider,
    RequestCancellation(cancel): RequestCancellation,
) -> Result<Response, ApiError> {
    let body = service(provider, &state).list_records(&cancel).await?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// `POST /insert` - stores a record and invalidates the cached list
pub async fn insert_record(
    State(state): State<AppState>,
    provider: RepositoryProvider,
    RequestCancellation(cancel): RequestCancellation,
    body: Bytes,
) -> Result<Html<String>, ApiError> {
    let request = InsertRecordRequest::from_body(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?;

    let id = service(provider, &state)
        .insert_record(&cancel, request.value)
        .await?;

    debug!(id, "Insert request completed");

    Ok(Html(format!(
        "Inserted a value with id {} <a href='/'>View Records</a>",
        id
    )))
}

/// `GET /records/{id}`
pub async fn get_record(
    State(state): State<AppState>,
    provider: RepositoryProvider,
    RequestCancellation(cancel): RequestCancellation,
    RecordId(id): RecordId,
) -> Result<Json<Record>, ApiError> {
    let record = service(provider, &state).get_record(&cancel, id).await?;
    Ok(Json(record))
}
