use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{attach_repositories, logging_middleware, RepositoryLayerState};
use super::records;
use super::state::AppState;
use crate::domain::RepositoryProvider;

/// Create the full router
///
/// Routes that need backends sit behind [`attach_repositories`]; `/health`
/// and `/live` do not touch the provider. Cancelling `shutdown` cancels every
/// in-flight backend call.
pub fn create_router(
    provider: RepositoryProvider,
    state: AppState,
    shutdown: CancellationToken,
) -> Router {
    let layer_state = RepositoryLayerState::new(provider, shutdown);

    let with_repositories = Router::new()
        .route("/", get(records::list_records))
        .route("/insert", post(records::insert_record))
        .route("/records/{id}", get(records::get_record))
        .route("/ready", get(health::ready_check))
        .route_layer(middleware::from_fn_with_state(
            layer_state,
            attach_repositories,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .merge(with_repositories)
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use bytes::Bytes;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::cache::MockCache;
    use crate::domain::storage::MockStorage;
    use crate::domain::{CacheExecutor, RetryPolicy, StorageExecutor};
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::services::{ALL_RECORDS_KEY, RECORDS_TABLE};
    use crate::infrastructure::storage::InMemoryStorage;

    fn router_with(storage: Arc<dyn StorageExecutor>, cache: Arc<dyn CacheExecutor>) -> Router {
        create_router(
            RepositoryProvider::new(storage, cache),
            AppState::new(RetryPolicy::none()),
            CancellationToken::new(),
        )
    }

    fn in_memory_router() -> Router {
        router_with(
            Arc::new(InMemoryStorage::new()),
            Arc::new(InMemoryCache::new()),
        )
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn insert_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/insert")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_live() {
        let app = in_memory_router();

        let response = app.clone().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");

        let response = app.oneshot(get_request("/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_before_any_insert_is_not_found() {
        let response = in_memory_router().oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["type"], "not_found_error");
    }

    #[tokio::test]
    async fn test_insert_then_list_sees_new_record() {
        let app = in_memory_router();

        let response = app.clone().oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.clone().oneshot(insert_request("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        let html = body_bytes(response).await;
        let html = std::str::from_utf8(&html).unwrap();
        assert!(html.contains("Inserted a value"));
        assert!(html.contains("<a href='/'>View Records</a>"));

        let response = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let records = body_json(response).await;
        let records = records.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], 1);
        assert_eq!(records[0]["table"], RECORDS_TABLE);
        assert!(
            records[0]["value"]
                .as_str()
                .unwrap()
                .starts_with("Entry Created At: ")
        );
    }

    #[tokio::test]
    async fn test_cached_list_is_returned_verbatim() {
        let storage = Arc::new(MockStorage::new());
        let cache = MockCache::new().with_entry(ALL_RECORDS_KEY, Bytes::from_static(b"[\"B\"]"));
        let app = router_with(storage.clone(), Arc::new(cache));

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, Bytes::from_static(b"[\"B\"]"));
        assert_eq!(storage.lookup_calls(), 0);
    }

    #[tokio::test]
    async fn test_insert_with_json_value_and_fetch_by_id() {
        let app = in_memory_router();

        let response = app
            .clone()
            .oneshot(insert_request(r#"{"value": {"name": "first"}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(get_request("/records/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let record = body_json(response).await;
        assert_eq!(record["id"], 1);
        assert_eq!(record["value"], json!({ "name": "first" }));

        let response = app.oneshot(get_request("/records/2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_record_id_is_json_bad_request() {
        let response = in_memory_router()
            .oneshot(get_request("/records/abc"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid record id")
        );
    }

    #[tokio::test]
    async fn test_insert_with_invalid_body_is_bad_request() {
        let response = in_memory_router()
            .oneshot(insert_request("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["type"],
            "invalid_request_error"
        );
    }

    #[tokio::test]
    async fn test_failed_invalidation_is_server_error_but_record_persists() {
        let storage = Arc::new(MockStorage::new());
        let cache = MockCache::new().with_delete_error("connection reset");
        let app = router_with(storage.clone(), Arc::new(cache));

        let response = app.oneshot(insert_request("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"]["type"], "server_error");

        let records = storage
            .lookup_all(&CancellationToken::new(), RECORDS_TABLE)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() {
        let storage = MockStorage::new().with_error("database unreachable");
        let app = router_with(Arc::new(storage), Arc::new(MockCache::new()));

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_ready_reports_backend_health() {
        let response = in_memory_router().oneshot(get_request("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");

        let app = router_with(
            Arc::new(MockStorage::new()),
            Arc::new(MockCache::new().with_get_error("refused")),
        );
        let response = app.oneshot(get_request("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "degraded");

        let app = router_with(
            Arc::new(MockStorage::new().with_error("down")),
            Arc::new(MockCache::new()),
        );
        let response = app.oneshot(get_request("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_route_without_repository_middleware_fails_loudly() {
        let app = Router::new()
            .route("/", get(records::list_records))
            .with_state(AppState::default());

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/live")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();

        let response = in_memory_router().oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
    }
}
