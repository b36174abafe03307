//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AuthAdapter` - The persistence surface the authentication framework calls
//! - `RecordStore` - Collection-scoped CRUD against the backing store
//! - `SchemaImporter` - Applies collection definitions at provisioning time

mod auth_adapter;
mod record_store;
mod schema_importer;

pub use auth_adapter::{AdapterError, AdapterResult, AuthAdapter, Capability, CapabilitySet};
pub use record_store::{
    Filter, RecordData, RecordStore, StoreError, StoreErrorCode, StoreRecord,
    VALIDATION_MISSING_REL_RECORDS, VALIDATION_NOT_UNIQUE, VALIDATION_REQUIRED,
};
pub use schema_importer::SchemaImporter;
