//! Application state shared by handlers

use std::sync::Arc;

use crate::domain::RetryPolicy;
use crate::infrastructure::services::ListInvalidation;

/// Handler-level settings. Backends are not held here; they reach handlers
/// through the repository middleware.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub retry: RetryPolicy,
    /// Shared by every request so cache write-backs are ordered against
    /// invalidations
    pub invalidation: Arc<ListInvalidation>,
}

impl AppState {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            invalidation: Arc::default(),
        }
    }
}
