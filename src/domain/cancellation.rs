//! Cooperative cancellation for executor calls
//!
//! Every storage and cache call receives the caller's [`CancellationToken`].
//! Backends check it before touching state and race remote calls against it.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::DomainError;

/// Fails with [`DomainError::Cancelled`] if the token has already fired
pub fn ensure_active(cancel: &CancellationToken, operation: &str) -> Result<(), DomainError> {
    if cancel.is_cancelled() {
        return Err(DomainError::cancelled(format!(
            "{} cancelled before it started",
            operation
        )));
    }
    Ok(())
}

/// Runs `future` to completion unless the token fires first
pub async fn cancellable<T, F>(
    cancel: &CancellationToken,
    operation: &str,
    future: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    ensure_active(cancel, operation)?;

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DomainError::cancelled(format!("{} cancelled", operation))),
        result = future => result,
    }
}
