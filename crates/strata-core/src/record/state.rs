use crate::stmt::Value;

use indexmap::IndexMap;

/// Engine-managed state carried by every record next to its user fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordState {
    /// The record has a matching row in the database.
    pub persisted: bool,

    /// The in-memory record reflects its row fully enough to be updated.
    pub writable: bool,

    /// Columns the record exposes without a user field, such as foreign keys
    /// injected by a parent relationship.
    pub virtual_columns: IndexMap<String, Value>,
}

impl Default for RecordState {
    fn default() -> Self {
        Self {
            persisted: false,
            writable: true,
            virtual_columns: IndexMap::new(),
        }
    }
}
