//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `pocketbase` - `RecordStore` / `SchemaImporter` over the PocketBase REST API
//! - `memory` - In-memory `RecordStore` for tests and local development

pub mod memory;
pub mod pocketbase;

pub use memory::InMemoryRecordStore;
pub use pocketbase::{PocketBaseClient, PocketBaseConfig};
