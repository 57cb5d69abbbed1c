use super::{db::ModelSchema, Schema};
use crate::Result;

use indexmap::IndexMap;

/// Every schema known to the program, keyed by table name.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and adds a schema. Conflicting hook declarations and
    /// duplicate tables are rejected.
    pub fn register(&mut self, schema: Schema) -> Result<()> {
        schema.validate()?;

        if self.schemas.contains_key(schema.table()) {
            crate::bail!("table `{}` is already registered", schema.table());
        }

        self.schemas.insert(schema.table().to_string(), schema);
        Ok(())
    }

    pub fn get(&self, table: &str) -> Option<&Schema> {
        self.schemas.get(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Describes the registered tables for migrations and test setup.
    pub fn model_schema(&self) -> ModelSchema {
        ModelSchema {
            tables: self.schemas.values().map(Schema::table_def).collect(),
        }
    }
}
