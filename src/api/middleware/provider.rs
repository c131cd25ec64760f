//! Attaches the repository provider to every request

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tokio_util::sync::CancellationToken;

use crate::domain::RepositoryProvider;

/// Per-request cancellation token, derived from the server shutdown token
///
/// The token is cancelled when the response future is dropped (client went
/// away) or when the server shuts down.
#[derive(Debug, Clone)]
pub struct RequestCancellation(pub CancellationToken);

/// State consumed by [`attach_repositories`]
#[derive(Debug, Clone)]
pub struct RepositoryLayerState {
    pub provider: RepositoryProvider,
    pub shutdown: CancellationToken,
}

impl RepositoryLayerState {
    pub fn new(provider: RepositoryProvider, shutdown: CancellationToken) -> Self {
        Self { provider, shutdown }
    }
}

/// Inserts the provider, both executor handles and a request-scoped
/// cancellation token into the request extensions
pub async fn attach_repositories(
    State(layer): State<RepositoryLayerState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = layer.shutdown.child_token();
    let _guard = token.clone().drop_guard();

    let extensions = request.extensions_mut();
    extensions.insert(layer.provider.storage_handle());
    extensions.insert(layer.provider.cache_handle());
    extensions.insert(layer.provider);
    extensions.insert(RequestCancellation(token));

    next.run(request).await
}
