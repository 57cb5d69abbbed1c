//! Plans a [`Query`] into a structured `SELECT` and the ordered list of
//! columns the result set scans.

use crate::query::{Query, Relationship};

use strata_core::{
    schema::{Column, RelationKind, Schema},
    stmt::{ColumnRef, Join, JoinKind, Projection, Select},
    Error, Result,
};

/// A compiled read.
#[derive(Debug, Clone)]
pub struct Compiled {
    /// Columns in projection order. Scan order is fixed here.
    pub columns: Vec<BoundColumn>,

    /// OneToOne relationships joined inline, indexed by
    /// [`Owner::Relation`].
    pub joined: Vec<Relationship>,

    pub select: Select,
}

/// A projected column and the record it is scanned into.
#[derive(Debug, Clone)]
pub struct BoundColumn {
    pub owner: Owner,
    pub column: Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The queried record.
    Root,

    /// The related record of the joined relationship at this index.
    Relation(usize),
}

/// Hands out table aliases unique within one statement.
#[derive(Debug, Default)]
pub(crate) struct Aliases {
    used: Vec<String>,
}

impl Aliases {
    /// Returns `schema` unchanged if its alias is free, otherwise a copy
    /// under the first free numbered alias.
    pub(crate) fn claim(&mut self, schema: &Schema) -> Schema {
        let base = schema.alias();
        let mut alias = base.to_string();
        let mut n = 1;

        while self.used.contains(&alias) {
            n += 1;
            alias = format!("{base}{n}");
        }

        self.used.push(alias.clone());

        if alias == base {
            schema.clone()
        } else {
            schema.with_alias(alias)
        }
    }
}

/// Compiles `query` into a `SELECT` with OneToOne relationships joined.
///
/// OneToMany and Through relationships are not part of the statement; the
/// batching runner loads them with side queries.
pub fn compile(query: &Query) -> Result<Compiled> {
    query.validate()?;

    let schema = query.schema();
    let mut aliases = Aliases::default();
    aliases.claim(schema);

    let mut columns = root_columns(query)?;
    let mut joined = vec![];
    let mut joins = vec![];

    for relationship in query.relationships() {
        if relationship.kind != RelationKind::OneToOne {
            continue;
        }

        let (fk, inverse) = schema.foreign_key(&relationship.field).ok_or_else(|| {
            Error::invalid_relation(&relationship.field, "missing foreign key column")
        })?;

        let original = &relationship.schema;
        let related = aliases.claim(original);

        let on = if inverse {
            (schema.column(fk), related.id_column())
        } else {
            (related.column(fk), schema.id_column())
        };

        let mut filter = relationship.filter.clone().unwrap_or_default();
        filter.realias(original.alias(), related.alias());

        let index = joined.len();
        columns.extend(related.columns().iter().map(|column| BoundColumn {
            owner: Owner::Relation(index),
            column: column.clone(),
        }));

        joins.push(Join {
            kind: JoinKind::Left,
            table: related.table_ref(),
            on,
            filter,
        });

        let mut relationship = relationship.clone();
        relationship.schema = related;
        joined.push(relationship);
    }

    let projection = columns
        .iter()
        .map(|bound| {
            let alias = match bound.owner {
                Owner::Root => schema.alias(),
                Owner::Relation(i) => joined[i].schema.alias(),
            };
            ColumnRef::new(alias, bound.column.clone())
        })
        .collect();

    let mut select = Select::new(schema.table_ref(), Projection::Columns(projection));
    select.joins = joins;
    select.filter = query.get_filter().clone();
    select.order_by = query.get_order_by().to_vec();
    select.offset = query.get_offset();
    select.limit = query.get_limit();

    Ok(Compiled {
        columns,
        joined,
        select,
    })
}

/// Compiles the `SELECT COUNT(*)` of the rows `query` matches. Ordering,
/// offset and limit do not apply.
pub fn compile_count(query: &Query) -> Result<Select> {
    query.validate()?;

    let schema = query.schema();
    let mut select = Select::new(schema.table_ref(), Projection::Count);
    select.filter = query.get_filter().clone();
    Ok(select)
}

/// The root schema's columns after applying the projection. The primary key
/// is always projected so that loaded records keep their identity.
fn root_columns(query: &Query) -> Result<Vec<BoundColumn>> {
    let schema = query.schema();

    for name in query.selected().iter().chain(query.excluded()) {
        if schema.find_column(name).is_none() {
            return Err(Error::unknown_column(name));
        }
    }

    let id = &schema.id_field().name;
    let columns = schema
        .columns()
        .iter()
        .filter(|column| {
            if column.name == *id {
                return true;
            }
            let selected = query.selected().is_empty() || query.selected().contains(&column.name);
            selected && !query.excluded().contains(&column.name)
        })
        .map(|column| BoundColumn {
            owner: Owner::Root,
            column: column.clone(),
        })
        .collect();

    Ok(columns)
}
