//! HTTP request and response types

pub mod error;
pub mod records;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use records::InsertRecordRequest;
