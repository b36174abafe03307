//! In-memory adapters for tests and local development.

mod record_store;

pub use record_store::InMemoryRecordStore;
