//! Application layer - the adapter operations and provisioning.
//!
//! `StoreAuthAdapter` composes `RecordStore` calls through the field mapper.
//! `provisioning` renders and applies the collection schema.

pub mod field_mapper;
pub mod provisioning;
mod store_adapter;

pub use provisioning::{apply_schema, render_schema, write_schema, ProvisioningError};
pub use store_adapter::StoreAuthAdapter;
