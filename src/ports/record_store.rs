//! Record store port - collection-scoped CRUD against the backing store.
//!
//! The adapter layer talks to PocketBase (or an in-memory double) only
//! through this trait. Records are untyped JSON maps keyed by store column
//! name; typing happens in `application::field_mapper`.
//!
//! # Contract
//!
//! Implementations must:
//! - Return `Ok(None)` from `get_one` / `get_first_list_item` on a miss
//! - Return `StoreErrorCode::NotFound` from `update` / `delete` on a miss
//! - Surface constraint violations as `StoreErrorCode::Validation` with the
//!   offending column and code preserved in `data`
//! - Never retry or compensate

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column name to value. `null` means "absent".
pub type RecordData = Map<String, Value>;

/// A record as returned by the store: its id plus every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: RecordData,
}

impl StoreRecord {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }
}

/// Equality conditions joined by logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter with a single `field = value` condition.
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::default().and_eq(field, value)
    }

    pub fn and_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter against a record. `id` addresses the record id.
    ///
    /// A missing column compares equal to `null`.
    pub fn matches(&self, record: &StoreRecord) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            if field == "id" {
                return expected.as_str() == Some(record.id.as_str());
            }
            let actual = record.fields.get(field).unwrap_or(&Value::Null);
            values_equal(actual, expected)
        })
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

/// Port for collection-scoped record operations.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Authenticates as the privileged principal used for all later calls.
    async fn authenticate(&self, identity: &str, password: &str) -> Result<(), StoreError>;

    /// Inserts a record and returns it as stored.
    async fn create(&self, collection: &str, data: RecordData) -> Result<StoreRecord, StoreError>;

    /// Fetches one record by id. `Ok(None)` when absent.
    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<StoreRecord>, StoreError>;

    /// Fetches the first record matching `filter`. `Ok(None)` when nothing matches.
    async fn get_first_list_item(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<StoreRecord>, StoreError>;

    /// Fetches every record matching `filter`.
    async fn get_full_list(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<StoreRecord>, StoreError>;

    /// Applies a partial update. Only the given columns change.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: RecordData,
    ) -> Result<StoreRecord, StoreError>;

    /// Deletes a record by id.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Errors from record store operations.
///
/// `data` carries the store's per-field error payload unmodified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    /// Error code for categorization.
    pub code: StoreErrorCode,

    /// HTTP status, when the error came from a response.
    pub status: Option<u16>,

    /// Human-readable message.
    pub message: String,

    /// Per-field error details, e.g. `{"user_email": {"code": "validation_not_unique", ...}}`.
    pub data: Value,
}

impl StoreError {
    /// Create a new store error.
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: code.default_status(),
            message: message.into(),
            data: Value::Object(Map::new()),
        }
    }

    /// Create from an HTTP error response.
    pub fn from_status(status: u16, message: impl Into<String>, data: Value) -> Self {
        Self {
            code: StoreErrorCode::from_status(status),
            status: Some(status),
            message: message.into(),
            data,
        }
    }

    /// Attach per-field error details.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Network, message)
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Decode, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(
            StoreErrorCode::NotFound,
            format!("{} not found", resource),
        )
    }

    /// Create a validation error with per-field details.
    pub fn validation(message: impl Into<String>, data: Value) -> Self {
        Self::new(StoreErrorCode::Validation, message).with_data(data)
    }

    /// Field-level error codes reported in `data`, keyed by column.
    pub fn field_codes(&self) -> Vec<(&str, &str)> {
        self.data
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|(column, detail)| {
                        detail
                            .get("code")
                            .and_then(Value::as_str)
                            .map(|code| (column.as_str(), code))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when the store rejected the write for a duplicate unique value.
    pub fn is_not_unique(&self) -> bool {
        self.code == StoreErrorCode::Validation
            && self
                .field_codes()
                .iter()
                .any(|(_, code)| *code == VALIDATION_NOT_UNIQUE)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == StoreErrorCode::NotFound
    }
}

/// PocketBase field error code for a unique index violation.
pub const VALIDATION_NOT_UNIQUE: &str = "validation_not_unique";

/// PocketBase field error code for a missing required value.
pub const VALIDATION_REQUIRED: &str = "validation_required";

/// PocketBase field error code for a relation to a record that does not exist.
pub const VALIDATION_MISSING_REL_RECORDS: &str = "validation_missing_rel_records";

/// Store error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorCode {
    /// Request rejected by field validation (uniqueness, relations, required).
    Validation,

    /// Missing or invalid credentials.
    Unauthorized,

    /// Authenticated but not allowed.
    Forbidden,

    /// Record or collection not found.
    NotFound,

    /// Any other non-success response.
    Server,

    /// Connection failure or timeout.
    Network,

    /// Response body could not be decoded.
    Decode,
}

impl StoreErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => StoreErrorCode::Validation,
            401 => StoreErrorCode::Unauthorized,
            403 => StoreErrorCode::Forbidden,
            404 => StoreErrorCode::NotFound,
            _ => StoreErrorCode::Server,
        }
    }

    fn default_status(&self) -> Option<u16> {
        match self {
            StoreErrorCode::Validation => Some(400),
            StoreErrorCode::Unauthorized => Some(401),
            StoreErrorCode::Forbidden => Some(403),
            StoreErrorCode::NotFound => Some(404),
            StoreErrorCode::Server | StoreErrorCode::Network | StoreErrorCode::Decode => None,
        }
    }
}

impl std::fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StoreErrorCode::Validation => "validation",
            StoreErrorCode::Unauthorized => "unauthorized",
            StoreErrorCode::Forbidden => "forbidden",
            StoreErrorCode::NotFound => "not_found",
            StoreErrorCode::Server => "server",
            StoreErrorCode::Network => "network",
            StoreErrorCode::Decode => "decode",
        };
        write!(f, "{}", s)
    }
}
