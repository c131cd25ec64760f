use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Operation cancelled: {message}")]
    Cancelled { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Whether a retry could plausibly succeed. Absence and cancellation are
    /// final answers; backend failures may be transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Cache { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Table 'records' not found");
        assert_eq!(error.to_string(), "Not found: Table 'records' not found");
        assert!(error.is_not_found());
    }

    #[test]
    fn test_cache_error() {
        let error = DomainError::cache("connection refused");
        assert_eq!(error.to_string(), "Cache error: connection refused");
    }

    #[test]
    fn test_transient_classification() {
        assert!(DomainError::storage("timeout").is_transient());
        assert!(DomainError::cache("reset").is_transient());
        assert!(!DomainError::not_found("missing").is_transient());
        assert!(!DomainError::cancelled("client gone").is_transient());
        assert!(!DomainError::serialization("bad").is_transient());
    }
}
