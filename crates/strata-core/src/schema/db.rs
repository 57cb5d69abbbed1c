//! DDL-level description of the tables behind the registered schemas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every table known to the application, in registration order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub tables: Vec<TableDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Reference>,
}

/// A foreign key constraint target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub table: String,
    pub column: String,
}

/// PostgreSQL storage types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    Integer,
    BigInt,
    /// `BIGSERIAL`, a `BIGINT` filled from a sequence.
    BigSerial,
    Double,
    Text,
    Uuid,
    Timestamptz,
    Jsonb,
    Array(Box<ColumnType>),
}

impl ModelSchema {
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|table| table.name == name)
    }
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.primary_key)
    }
}

impl ColumnType {
    pub fn sql_name(&self) -> String {
        match self {
            ColumnType::Boolean => "BOOLEAN".into(),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::BigInt => "BIGINT".into(),
            ColumnType::BigSerial => "BIGSERIAL".into(),
            ColumnType::Double => "DOUBLE PRECISION".into(),
            ColumnType::Text => "TEXT".into(),
            ColumnType::Uuid => "UUID".into(),
            ColumnType::Timestamptz => "TIMESTAMPTZ".into(),
            ColumnType::Jsonb => "JSONB".into(),
            ColumnType::Array(inner) => format!("{}[]", inner.sql_name()),
        }
    }

    /// True for types assigned by the database when omitted from an insert.
    pub fn is_serial(&self) -> bool {
        matches!(self, ColumnType::BigSerial)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_name())
    }
}
