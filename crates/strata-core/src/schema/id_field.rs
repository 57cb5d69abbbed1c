use super::db::ColumnType;
use crate::stmt::IdKind;

/// The primary key column of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdField {
    pub name: String,
    pub kind: IdKind,
}

impl IdField {
    pub fn new(name: impl Into<String>, kind: IdKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Storage type of the key column.
    pub fn column_type(&self) -> ColumnType {
        match self.kind {
            IdKind::AutoIncrement => ColumnType::BigSerial,
            IdKind::Uuid | IdKind::Ulid => ColumnType::Uuid,
        }
    }
}
