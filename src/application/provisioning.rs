//! Provisioning - renders and applies the collection schema.
//!
//! Run once per environment, before the adapter serves traffic.

use std::path::Path;

use crate::domain::schema::{self, CollectionDefinition};
use crate::ports::{SchemaImporter, StoreError};

/// Errors from provisioning.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("failed to serialize schema: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write schema to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store rejected schema import: {0}")]
    Import(#[from] StoreError),
}

/// The schema artifact as pretty-printed JSON.
pub fn render_schema() -> Result<String, ProvisioningError> {
    Ok(schema::to_json_pretty()?)
}

/// Writes the schema artifact to `path`, replacing any existing file.
pub fn write_schema(path: &Path) -> Result<(), ProvisioningError> {
    let json = render_schema()?;
    std::fs::write(path, json + "\n").map_err(|source| ProvisioningError::Write {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Wrote schema");
    Ok(())
}

/// Imports the auth collections. Other collections in the store are kept.
pub async fn apply_schema(importer: &dyn SchemaImporter) -> Result<(), ProvisioningError> {
    apply_collections(importer, schema::collections()).await
}

async fn apply_collections(
    importer: &dyn SchemaImporter,
    collections: &[CollectionDefinition],
) -> Result<(), ProvisioningError> {
    importer.import_collections(collections).await.map_err(|e| {
        tracing::error!(error = %e, data = %e.data, "Schema import failed");
        e
    })?;

    let names: Vec<&str> = collections.iter().map(|c| c.name.as_str()).collect();
    tracing::info!(collections = ?names, "Schema applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryRecordStore;
    use crate::domain::schema::columns::users;
    use crate::ports::{RecordData, RecordStore};

    #[test]
    fn writes_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pb_schema.json");

        write_schema(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(5));
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("pb_schema.json");

        let err = write_schema(&path).unwrap_err();
        assert!(matches!(err, ProvisioningError::Write { .. }));
    }

    #[tokio::test]
    async fn applied_schema_makes_collections_usable() {
        let store = InMemoryRecordStore::new();
        apply_schema(&store).await.unwrap();

        let mut data = RecordData::new();
        data.insert(users::EMAIL.to_string(), serde_json::json!("a@x.com"));
        assert!(store.create(users::COLLECTION, data).await.is_ok());
    }
}
