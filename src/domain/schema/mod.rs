//! Declarative schema for the auth collections.
//!
//! Applied to the store once at environment setup (see
//! `application::provisioning`). At request time the store enforces these
//! constraints; the adapter never re-validates them.

pub mod columns;
mod collection;
mod definitions;
mod field;

pub use collection::{CollectionDefinition, UniqueConstraint};
pub use definitions::{collection, collections, to_json_pretty};
pub use field::{FieldDefinition, FieldType};
