use super::{FromValue, Value};
use crate::Result;

use std::fmt;
use uuid::Uuid;

/// The primary key of a record.
///
/// Integer keys are assigned by the database on insert; UUID and ULID keys
/// are generated client-side before the `INSERT` is issued.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// The record has not been assigned a key yet.
    #[default]
    Unset,
    Int(i64),
    Uuid(Uuid),
}

/// Hashable projection of an identifier, used to index records by key
/// while eager loading relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RawId {
    Int(i64),
    Uuid(Uuid),
}

/// How a schema's primary key is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// `BIGSERIAL` column filled in by the database.
    AutoIncrement,

    /// Random (v4) UUID generated by the client.
    Uuid,

    /// Time-ordered identifier, stored as a v7 UUID.
    Ulid,
}

impl Identifier {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn raw(&self) -> Option<RawId> {
        match *self {
            Self::Unset => None,
            Self::Int(v) => Some(RawId::Int(v)),
            Self::Uuid(v) => Some(RawId::Uuid(v)),
        }
    }

    pub fn to_value(&self) -> Value {
        match *self {
            Self::Unset => Value::Null,
            Self::Int(v) => Value::I64(v),
            Self::Uuid(v) => Value::Uuid(v),
        }
    }
}

impl From<Identifier> for Value {
    fn from(value: Identifier) -> Self {
        value.to_value()
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Uuid> for Identifier {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<RawId> for Identifier {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Int(v) => Self::Int(v),
            RawId::Uuid(v) => Self::Uuid(v),
        }
    }
}

impl From<RawId> for Value {
    fn from(value: RawId) -> Self {
        Identifier::from(value).to_value()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("<unset>"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
        }
    }
}

impl IdKind {
    pub fn is_auto_increment(self) -> bool {
        matches!(self, Self::AutoIncrement)
    }

    /// Generates a fresh client-side key, or `None` when the database assigns
    /// it.
    pub fn generate(self) -> Option<Identifier> {
        match self {
            Self::AutoIncrement => None,
            Self::Uuid => Some(Identifier::Uuid(Uuid::new_v4())),
            Self::Ulid => Some(Identifier::Uuid(Uuid::now_v7())),
        }
    }

    /// Builds an identifier of this kind from a scanned value.
    ///
    /// Used when a key arrives in a column the record does not own, such as
    /// the parent key projected from a join table.
    pub fn scan(self, value: Value) -> Result<Identifier> {
        let id = Identifier::from_value(value)?;
        match (self, id) {
            (_, Identifier::Unset) => Ok(id),
            (Self::AutoIncrement, Identifier::Int(_)) => Ok(id),
            (Self::Uuid | Self::Ulid, Identifier::Uuid(_)) => Ok(id),
            (_, other) => Err(crate::Error::type_conversion(other.to_value(), "Identifier")),
        }
    }
}
