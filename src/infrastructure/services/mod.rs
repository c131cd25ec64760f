//! Application services

mod record_service;

pub use record_service::{ListInvalidation, RecordService, ALL_RECORDS_KEY, RECORDS_TABLE};
