//! Schema importer port - applies collection definitions to a store.

use async_trait::async_trait;

use super::record_store::StoreError;
use crate::domain::schema::CollectionDefinition;

/// Creates or updates collections to match the given definitions.
///
/// Collections not in `collections` are left untouched.
#[async_trait]
pub trait SchemaImporter: Send + Sync {
    async fn import_collections(&self, collections: &[CollectionDefinition]) -> Result<(), StoreError>;
}
