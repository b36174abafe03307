//! In-Memory Record Store Adapter
//!
//! Holds collections and records in memory, enforcing the constraints the
//! collection definitions declare: required columns, unique indexes and
//! relation existence. Deleting a referenced record unsets non-required
//! relation columns and is rejected while a required one points at it.
//! Text patterns are not checked.
//!
//! Useful for testing and development.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::domain::schema::{CollectionDefinition, FieldDefinition, FieldType};
use crate::ports::{
    Filter, RecordData, RecordStore, SchemaImporter, StoreError, StoreErrorCode, StoreRecord,
    VALIDATION_MISSING_REL_RECORDS, VALIDATION_NOT_UNIQUE, VALIDATION_REQUIRED,
};

const ID_LENGTH: usize = 15;

#[derive(Debug, Default)]
struct State {
    schemas: HashMap<String, CollectionDefinition>,
    records: HashMap<String, Vec<StoreRecord>>,
    credentials: Option<(String, String)>,
}

impl State {
    fn schema(&self, collection: &str) -> Result<&CollectionDefinition, StoreError> {
        self.schemas.get(collection).ok_or_else(|| {
            StoreError::new(StoreErrorCode::NotFound, "Missing collection context.")
        })
    }

    fn schema_by_id(&self, id: &str) -> Option<&CollectionDefinition> {
        self.schemas.values().find(|s| s.id == id)
    }

    fn records_in(&self, collection: &str) -> &[StoreRecord] {
        self.records.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }

    fn id_taken(&self, id: &str) -> bool {
        self.records
            .values()
            .flatten()
            .any(|record| record.id == id)
    }
}

/// In-memory record store
#[derive(Debug, Clone)]
pub struct InMemoryRecordStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryRecordStore {
    /// Create an empty store. Collections must be imported before use.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Create a store with `collections` already imported.
    pub fn with_collections(collections: &[CollectionDefinition]) -> Self {
        let mut state = State::default();
        for definition in collections {
            state.records.insert(definition.name.clone(), Vec::new());
            state
                .schemas
                .insert(definition.name.clone(), definition.clone());
        }
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Only accept these superuser credentials in `authenticate`.
    pub async fn require_credentials(&self, identity: &str, password: &str) {
        self.state.write().await.credentials = Some((identity.to_string(), password.to_string()));
    }

    /// Get the number of records in a collection
    pub async fn record_count(&self, collection: &str) -> usize {
        self.state.read().await.records_in(collection).len()
    }

    /// Clear all records, keeping collections (useful for tests)
    pub async fn clear(&self) {
        for records in self.state.write().await.records.values_mut() {
            records.clear();
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..ID_LENGTH].to_string()
}

fn violation(code: &str, message: &str) -> Value {
    json!({ "code": code, "message": message })
}

/// Coerces a written value into what the store keeps for that column type.
fn normalize(field: &FieldDefinition, value: Value) -> Result<Value, Value> {
    if value.is_null() {
        return Ok(field.field_type.zero_value());
    }

    match field.field_type {
        FieldType::Text | FieldType::Email | FieldType::Relation => match value {
            Value::String(_) => Ok(value),
            _ => Err(violation("validation_invalid_value", "Must be a string.")),
        },
        FieldType::Date => match value.as_str() {
            Some("") => Ok(Value::String(String::new())),
            Some(raw) => Timestamp::parse(raw)
                .map(|ts| Value::String(ts.to_store_format()))
                .map_err(|_| violation("validation_invalid_date", "Must be a valid date.")),
            None => Err(violation("validation_invalid_date", "Must be a valid date.")),
        },
        FieldType::Bool => match value {
            Value::Bool(_) => Ok(value),
            _ => Err(violation("validation_invalid_value", "Must be a boolean.")),
        },
        FieldType::Number => match value {
            Value::Number(_) => Ok(value),
            _ => Err(violation("validation_invalid_number", "Must be a number.")),
        },
    }
}

/// Checks declared constraints on the merged column values of one record.
fn check_field(state: &State, field: &FieldDefinition, value: &Value) -> Option<Value> {
    let is_zero = *value == field.field_type.zero_value();
    if field.required && is_zero {
        return Some(violation(VALIDATION_REQUIRED, "Cannot be blank."));
    }

    match field.field_type {
        FieldType::Number => {
            let n = value.as_f64().unwrap_or_default();
            if field.min.map_or(false, |min| n < min) || field.max.map_or(false, |max| n > max) {
                return Some(violation("validation_out_of_range", "Value out of range."));
            }
        }
        FieldType::Text => {
            let len = value.as_str().map_or(0, |s| s.chars().count()) as f64;
            if field.max.map_or(false, |max| len > max) {
                return Some(violation("validation_length_out_of_range", "Value too long."));
            }
        }
        FieldType::Relation if !is_zero => {
            let exists = field
                .collection_id
                .as_deref()
                .and_then(|target| state.schema_by_id(target))
                .zip(value.as_str())
                .map_or(false, |(target, id)| {
                    state.records_in(&target.name).iter().any(|r| r.id == id)
                });
            if !exists {
                return Some(violation(
                    VALIDATION_MISSING_REL_RECORDS,
                    "Failed to find all relation records with the provided ids.",
                ));
            }
        }
        _ => {}
    }
    None
}

/// Validates `candidate` against its collection's schema and unique indexes.
///
/// `candidate.fields` must already hold a value for every declared column.
fn validate(
    state: &State,
    schema: &CollectionDefinition,
    candidate: &StoreRecord,
    message: &str,
) -> Result<(), StoreError> {
    let mut errors = Map::new();

    for field in &schema.fields {
        let value = candidate.get(&field.name).unwrap_or(&Value::Null);
        if let Some(detail) = check_field(state, field, value) {
            errors.insert(field.name.clone(), detail);
        }
    }

    for constraint in schema.unique_constraints() {
        let values: Vec<&Value> = constraint
            .columns
            .iter()
            .map(|c| candidate.get(c).unwrap_or(&Value::Null))
            .collect();
        if values.iter().all(|v| v.as_str() == Some("")) {
            continue;
        }

        let clash = state.records_in(&schema.name).iter().any(|existing| {
            existing.id != candidate.id
                && constraint
                    .columns
                    .iter()
                    .zip(&values)
                    .all(|(c, v)| existing.get(c).unwrap_or(&Value::Null) == *v)
        });
        if clash {
            for column in &constraint.columns {
                errors.insert(
                    column.clone(),
                    violation(VALIDATION_NOT_UNIQUE, "Value must be unique."),
                );
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let errors = Value::Object(errors);
        tracing::debug!(collection = %schema.name, errors = %errors, "Rejected record");
        Err(StoreError::validation(message, errors))
    }
}

/// Merges written columns into `target`, normalizing each declared column
/// and dropping unknown ones.
fn apply(
    schema: &CollectionDefinition,
    target: &mut RecordData,
    data: RecordData,
    message: &str,
) -> Result<(), StoreError> {
    let mut errors = Map::new();
    for (column, value) in data {
        let Some(field) = schema.field_named(&column) else {
            continue;
        };
        match normalize(field, value) {
            Ok(normalized) => {
                target.insert(column, normalized);
            }
            Err(detail) => {
                errors.insert(column, detail);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(StoreError::validation(message, Value::Object(errors)))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn authenticate(&self, identity: &str, password: &str) -> Result<(), StoreError> {
        let state = self.state.read().await;
        match &state.credentials {
            Some((expected_identity, expected_password))
                if expected_identity != identity || expected_password != password =>
            {
                Err(StoreError::from_status(
                    400,
                    "Failed to authenticate.",
                    json!({}),
                ))
            }
            _ => Ok(()),
        }
    }

    async fn create(&self, collection: &str, mut data: RecordData) -> Result<StoreRecord, StoreError> {
        const MESSAGE: &str = "Failed to create record.";
        let mut state = self.state.write().await;
        let schema = state.schema(collection)?.clone();

        let id = match data.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => generate_id(),
        };
        if state.id_taken(&id) {
            return Err(StoreError::validation(
                MESSAGE,
                json!({ "id": violation(VALIDATION_NOT_UNIQUE, "Value must be unique.") }),
            ));
        }

        let mut fields = RecordData::new();
        fields.insert("collectionName".to_string(), json!(schema.name));
        for field in &schema.fields {
            fields.insert(field.name.clone(), field.field_type.zero_value());
        }
        apply(&schema, &mut fields, data, MESSAGE)?;

        let now = Timestamp::now().to_store_format();
        fields.insert("created".to_string(), json!(now));
        fields.insert("updated".to_string(), json!(now));

        let record = StoreRecord { id, fields };
        validate(&state, &schema, &record, MESSAGE)?;

        state
            .records
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<StoreRecord>, StoreError> {
        let state = self.state.read().await;
        state.schema(collection)?;
        Ok(state.records_in(collection).iter().find(|r| r.id == id).cloned())
    }

    async fn get_first_list_item(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<StoreRecord>, StoreError> {
        let state = self.state.read().await;
        state.schema(collection)?;
        Ok(state
            .records_in(collection)
            .iter()
            .find(|r| filter.matches(r))
            .cloned())
    }

    async fn get_full_list(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<StoreRecord>, StoreError> {
        let state = self.state.read().await;
        state.schema(collection)?;
        Ok(state
            .records_in(collection)
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: RecordData,
    ) -> Result<StoreRecord, StoreError> {
        const MESSAGE: &str = "Failed to update record.";
        let mut state = self.state.write().await;
        let schema = state.schema(collection)?.clone();

        let mut record = state
            .records_in(collection)
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(&format!("{}/{}", collection, id)))?;

        apply(&schema, &mut record.fields, patch, MESSAGE)?;
        record.fields.insert(
            "updated".to_string(),
            json!(Timestamp::now().to_store_format()),
        );
        validate(&state, &schema, &record, MESSAGE)?;

        if let Some(slot) = state
            .records
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
        {
            *slot = record.clone();
        }
        Ok(record)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let schema_id = state.schema(collection)?.id.clone();
        let schema_id = schema_id.as_str();

        if !state.records_in(collection).iter().any(|r| r.id == id) {
            return Err(StoreError::not_found(&format!("{}/{}", collection, id)));
        }

        // (collection, column, required) for every relation pointing here.
        let references: Vec<(String, String, bool)> = state
            .schemas
            .values()
            .flat_map(|s| {
                s.fields
                    .iter()
                    .filter(move |f| f.collection_id.as_deref() == Some(schema_id))
                    .map(move |f| (s.name.clone(), f.name.clone(), f.required))
            })
            .collect();

        let blocked = references.iter().any(|(source, column, required)| {
            *required
                && state
                    .records_in(source)
                    .iter()
                    .any(|r| r.get(column).and_then(Value::as_str) == Some(id))
        });
        if blocked {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                "Failed to delete record. Make sure that the record is not part of a required relation reference.",
            ));
        }

        let now = Timestamp::now().to_store_format();
        for (source, column, _) in &references {
            if let Some(records) = state.records.get_mut(source) {
                for record in records.iter_mut() {
                    if record.get(column).and_then(Value::as_str) == Some(id) {
                        record.fields.insert(column.clone(), json!(""));
                        record.fields.insert("updated".to_string(), json!(now));
                    }
                }
            }
        }

        if let Some(records) = state.records.get_mut(collection) {
            records.retain(|r| r.id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaImporter for InMemoryRecordStore {
    async fn import_collections(&self, collections: &[CollectionDefinition]) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        for definition in collections {
            state.records.entry(definition.name.clone()).or_default();
            state
                .schemas
                .insert(definition.name.clone(), definition.clone());
        }
        Ok(())
    }
}
