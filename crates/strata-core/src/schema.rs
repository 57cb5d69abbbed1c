mod builder;
pub use builder::SchemaBuilder;

mod column;
pub use column::{ident, Column, JsonCast, JsonPath};

pub mod db;

mod foreign_key;
pub use foreign_key::{ForeignKey, RelationKind};

mod id_field;
pub use id_field::IdField;

mod registry;
pub use registry::SchemaRegistry;

use crate::{
    record::{HookSet, Record},
    stmt::{ColumnRef, TableRef},
};

use indexmap::IndexMap;
use std::{fmt, sync::Arc};

/// Constructs a blank record of a schema's type.
pub type RecordFactory = fn() -> Box<dyn Record>;

/// Immutable metadata describing a record type.
///
/// Cloning is cheap. [`Schema::with_alias`] produces a descriptor sharing
/// everything but the alias, used when a table appears more than once in a
/// statement.
#[derive(Clone)]
pub struct Schema {
    alias: Arc<str>,
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    table: String,
    id: IdField,
    columns: Vec<Column>,
    foreign_keys: IndexMap<String, ForeignKey>,
    references: IndexMap<String, db::Reference>,
    hooks: HookSet,
    factory: RecordFactory,
}

impl Schema {
    pub fn builder(
        table: impl Into<String>,
        alias: impl Into<String>,
        factory: RecordFactory,
    ) -> SchemaBuilder {
        SchemaBuilder::new(table.into(), alias.into(), factory)
    }

    pub fn table(&self) -> &str {
        &self.inner.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.table(), self.alias())
    }

    pub fn id_field(&self) -> &IdField {
        &self.inner.id
    }

    /// Every column, primary key first, in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.inner.columns
    }

    /// Returns the column descriptor with the given name.
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.inner.columns.iter().find(|column| column.name == name)
    }

    /// References a column of this table under the schema's alias.
    ///
    /// Unknown names produce an untyped reference; the database reports
    /// them when the statement runs.
    pub fn column(&self, name: &str) -> ColumnRef {
        let column = self
            .find_column(name)
            .cloned()
            .unwrap_or_else(|| Column::untyped(name));
        ColumnRef::new(&*self.alias, column)
    }

    /// References the primary key column.
    pub fn id_column(&self) -> ColumnRef {
        self.column(&self.inner.id.name)
    }

    /// Every column qualified with the schema's alias.
    pub fn column_refs(&self) -> Vec<ColumnRef> {
        self.inner
            .columns
            .iter()
            .map(|column| ColumnRef::new(&*self.alias, column.clone()))
            .collect()
    }

    pub fn foreign_keys_map(&self) -> &IndexMap<String, ForeignKey> {
        &self.inner.foreign_keys
    }

    pub fn relationship(&self, field: &str) -> Option<&ForeignKey> {
        self.inner.foreign_keys.get(field)
    }

    /// Returns `(column, is_inverse)` for a OneToOne or OneToMany field.
    ///
    /// For an inverse OneToOne the column lives on this table; otherwise it
    /// lives on the related table.
    pub fn foreign_key(&self, field: &str) -> Option<(&str, bool)> {
        match self.inner.foreign_keys.get(field)? {
            ForeignKey::OneToOne { column, inverse } => Some((column, *inverse)),
            ForeignKey::OneToMany { column } => Some((column, false)),
            ForeignKey::Through { .. } => None,
        }
    }

    /// Returns `(left, right)` for a Through field. `left` references this
    /// table from the intermediate table and `right` references the related
    /// table.
    pub fn foreign_keys(&self, field: &str) -> Option<(&str, &str)> {
        match self.inner.foreign_keys.get(field)? {
            ForeignKey::Through { left, right } => Some((left, right)),
            _ => None,
        }
    }

    pub fn hooks(&self) -> HookSet {
        self.inner.hooks
    }

    /// Builds a blank record of this schema's type.
    pub fn new_record(&self) -> Box<dyn Record> {
        (self.inner.factory)()
    }

    /// Returns a descriptor that shares everything but the alias.
    pub fn with_alias(&self, alias: impl Into<String>) -> Schema {
        Schema {
            alias: alias.into().into(),
            inner: self.inner.clone(),
        }
    }

    /// The DDL-level description of this table.
    pub fn table_def(&self) -> db::TableDef {
        let columns = self
            .inner
            .columns
            .iter()
            .map(|column| db::ColumnDef {
                name: column.name.clone(),
                ty: column.ty.clone(),
                nullable: column.nullable,
                primary_key: column.name == self.inner.id.name,
                references: self.inner.references.get(&column.name).cloned(),
            })
            .collect();

        db::TableDef {
            name: self.inner.table.clone(),
            columns,
        }
    }

    /// Checks declaration-time rules that the builder cannot enforce on its
    /// own, such as conflicting hook declarations.
    pub fn validate(&self) -> crate::Result<()> {
        self.inner.hooks.validate(self.table())
    }

    /// True when both descriptors were built from the same declaration,
    /// regardless of alias.
    pub fn same_as(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("table", &self.inner.table)
            .field("alias", &self.alias)
            .field("id", &self.inner.id)
            .field("columns", &self.inner.columns)
            .field("foreign_keys", &self.inner.foreign_keys)
            .field("hooks", &self.inner.hooks)
            .finish()
    }
}
