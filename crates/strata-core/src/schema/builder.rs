use super::{
    db::{ColumnType, Reference},
    Column, ForeignKey, IdField, RecordFactory, Schema, SchemaInner,
};
use crate::{record::HookSet, stmt::IdKind};

use indexmap::IndexMap;
use std::sync::Arc;

/// Declares a [`Schema`].
///
/// ```ignore
/// let cars = Schema::builder("cars", "c", || Box::new(Car::default()))
///     .column("model", ColumnType::Text)
///     .virtual_column("owner_id", ColumnType::BigInt)
///     .one_to_one_inverse("owner", "owner_id")
///     .build();
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    table: String,
    alias: String,
    id: IdField,
    columns: Vec<Column>,
    foreign_keys: IndexMap<String, ForeignKey>,
    references: IndexMap<String, Reference>,
    hooks: HookSet,
    factory: RecordFactory,
}

impl SchemaBuilder {
    pub(super) fn new(table: String, alias: String, factory: RecordFactory) -> Self {
        Self {
            table,
            alias,
            id: IdField::new("id", IdKind::AutoIncrement),
            columns: vec![],
            foreign_keys: IndexMap::new(),
            references: IndexMap::new(),
            hooks: HookSet::NONE,
            factory,
        }
    }

    /// Sets the primary key. Defaults to an auto-increment `id`.
    pub fn id(mut self, name: impl Into<String>, kind: IdKind) -> Self {
        self.id = IdField::new(name, kind);
        self
    }

    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.push(Column::new(name, ty));
        self
    }

    pub fn nullable_column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        let mut column = Column::new(name, ty);
        column.nullable = true;
        self.columns.push(column);
        self
    }

    /// A nullable column kept among the record's virtual columns, typically a
    /// foreign key populated by the parent side of a relationship.
    pub fn virtual_column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        let mut column = Column::new(name, ty);
        column.nullable = true;
        column.is_virtual = true;
        self.columns.push(column);
        self
    }

    /// Declares a foreign key constraint for DDL output.
    pub fn references(mut self, column: impl Into<String>, table: impl Into<String>) -> Self {
        self.references.insert(
            column.into(),
            Reference {
                table: table.into(),
                column: "id".into(),
            },
        );
        self
    }

    /// OneToOne with the foreign key on the related table.
    pub fn one_to_one(self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.relationship(
            field,
            ForeignKey::OneToOne {
                column: column.into(),
                inverse: false,
            },
        )
    }

    /// OneToOne with the foreign key on this table.
    pub fn one_to_one_inverse(self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.relationship(
            field,
            ForeignKey::OneToOne {
                column: column.into(),
                inverse: true,
            },
        )
    }

    pub fn one_to_many(self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.relationship(
            field,
            ForeignKey::OneToMany {
                column: column.into(),
            },
        )
    }

    pub fn through(
        self,
        field: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.relationship(
            field,
            ForeignKey::Through {
                left: left.into(),
                right: right.into(),
            },
        )
    }

    pub fn relationship(mut self, field: impl Into<String>, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.insert(field.into(), foreign_key);
        self
    }

    pub fn hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Schema {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Column::new(self.id.name.clone(), self.id.column_type()));
        columns.extend(
            self.columns
                .into_iter()
                .filter(|column| column.name != self.id.name),
        );

        Schema {
            alias: self.alias.into(),
            inner: Arc::new(SchemaInner {
                table: self.table,
                id: self.id,
                columns,
                foreign_keys: self.foreign_keys,
                references: self.references,
                hooks: self.hooks,
                factory: self.factory,
            }),
        }
    }
}
