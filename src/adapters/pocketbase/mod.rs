//! PocketBase adapter - `RecordStore` and `SchemaImporter` over the REST API.

mod client;
mod filter;

pub use client::{PocketBaseClient, PocketBaseConfig, DEFAULT_ADMIN_COLLECTION};
pub use filter::{render_filter, render_partial};
