//! Stored record type

use serde::{Deserialize, Serialize};

/// Opaque record payload. Storage backends persist it without inspecting it.
pub type RecordValue = serde_json::Value;

/// A value stored under a table name and a storage-assigned identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub table: String,
    pub id: u64,
    pub value: RecordValue,
}

impl Record {
    pub fn new(table: impl Into<String>, id: u64, value: RecordValue) -> Self {
        Self {
            table: table.into(),
            id,
            value,
        }
    }
}
