//! Collection definitions and their unique indexes.

use serde::Serialize;

use super::field::FieldDefinition;

/// A uniqueness constraint over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub name: String,
    pub columns: Vec<String>,
}

impl UniqueConstraint {
    /// `CREATE UNIQUE INDEX <name> ON <collection> (<col>, ...)`
    pub fn statement(&self, collection: &str) -> String {
        format!(
            "CREATE UNIQUE INDEX {} ON {} ({})",
            self.name,
            collection,
            self.columns.join(", ")
        )
    }
}

/// A base collection in the import format PocketBase accepts.
///
/// Access rules are left out, which PocketBase treats as superuser-only.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionDefinition {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub fields: Vec<FieldDefinition>,
    pub indexes: Vec<String>,
    #[serde(skip)]
    unique_constraints: Vec<UniqueConstraint>,
}

impl CollectionDefinition {
    pub fn base(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: "base".to_string(),
            fields: Vec::new(),
            indexes: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    /// Adds a column. A column marked unique also gets a single-column index.
    pub fn field(mut self, field: FieldDefinition) -> Self {
        if field.unique {
            let index_name = format!("idx_{}_{}", self.name, field.name);
            self = self.with_constraint(index_name, vec![field.name.clone()]);
        }
        self.fields.push(field);
        self
    }

    /// Adds a composite unique index.
    pub fn unique_index(self, name: &str, columns: &[&str]) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.with_constraint(name.to_string(), columns)
    }

    fn with_constraint(mut self, name: String, columns: Vec<String>) -> Self {
        let constraint = UniqueConstraint { name, columns };
        self.indexes.push(constraint.statement(&self.name));
        self.unique_constraints.push(constraint);
        self
    }

    pub fn unique_constraints(&self) -> &[UniqueConstraint] {
        &self.unique_constraints
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}
