//! Eager loading of OneToMany and Through relationships.
//!
//! The runner pages the main query in windows of the batch size. For every
//! window it issues one side query per batched relationship, restricted to
//! the window's parent keys, and attaches the children before handing out
//! the window's parents one at a time.

use crate::{
    compile::{Aliases, BoundColumn, Compiled, Owner},
    query::{Query, Relationship},
    result_set::Hydrator,
    Store,
};

use std::collections::{HashMap, VecDeque};
use strata_core::{
    record::Related,
    schema::{RelationKind, Schema},
    stmt::{
        ColumnRef, Direction, IdKind, Join, JoinKind, OrderBy, Projection, RawId,
        Select, Value,
    },
    Error, Record, Result,
};

/// Drives a query with batched relationships behind the same
/// `next`/`get`/`close` surface as a [`ResultSet`](crate::ResultSet).
#[derive(Debug)]
pub struct BatchingRunner {
    store: Store,
    hydrator: Hydrator,

    /// The main statement; offset and limit are rewritten per batch.
    select: Select,

    relationships: Vec<Relationship>,
    offset: u64,
    limit: u64,
    batch_size: u64,

    cached: VecDeque<Box<dyn Record>>,
    current: Option<Box<dyn Record>>,
    emitted: u64,
    eof: bool,
    closed: bool,

    /// Set when a batch fails; every later `next` returns it again.
    failed: Option<Error>,
}

impl BatchingRunner {
    pub(crate) fn new(store: Store, query: &Query, compiled: Compiled, batch_size: u64) -> Self {
        let relationships = query
            .relationships()
            .iter()
            .filter(|relationship| relationship.kind.is_batched())
            .cloned()
            .collect();

        Self {
            store,
            hydrator: Hydrator {
                schema: query.schema().clone(),
                columns: compiled.columns,
                joined: compiled.joined,
                read_only: query.is_projected(),
            },
            select: compiled.select,
            relationships,
            offset: query.get_offset(),
            limit: query.get_limit(),
            batch_size: batch_size.max(1),
            cached: VecDeque::new(),
            current: None,
            emitted: 0,
            eof: false,
            closed: false,
            failed: None,
        }
    }

    /// Advances to the next record, fetching the next batch when the cached
    /// one is drained.
    pub async fn next(&mut self) -> Result<bool> {
        if self.closed {
            return Err(Error::already_closed("batching runner"));
        }

        if let Some(err) = &self.failed {
            return Err(err.clone());
        }

        if self.cached.is_empty() && !self.eof {
            if let Err(err) = self.fetch().await {
                self.failed = Some(err.clone());
                return Err(err);
            }
        }

        self.current = self.cached.pop_front();
        Ok(self.current.is_some())
    }

    /// Takes the current record.
    pub fn get(&mut self) -> Result<Box<dyn Record>> {
        self.current
            .take()
            .ok_or_else(|| Error::invalid_result("no current record; call `next` first"))
    }

    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::already_closed("batching runner"));
        }
        self.closed = true;
        self.eof = true;
        self.cached.clear();
        self.current = None;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn fetch(&mut self) -> Result<()> {
        let remaining = if self.limit == 0 {
            self.batch_size
        } else {
            self.batch_size.min(self.limit.saturating_sub(self.emitted))
        };

        if remaining == 0 {
            self.eof = true;
            return Ok(());
        }

        let mut select = self.select.clone();
        select.offset = self.offset + self.emitted;
        select.limit = remaining;

        let mut rows = self.store.select_rows(select).await?;
        let mut records = vec![];
        while let Some(row) = rows.next().await {
            records.push(self.hydrator.hydrate(row?)?);
        }
        drop(rows);

        let fetched = records.len() as u64;

        if records.is_empty() {
            self.eof = true;
            return Ok(());
        }

        let ids = records
            .iter()
            .filter_map(|record| record.id().raw())
            .collect::<Vec<_>>();

        for relationship in &self.relationships {
            let children = match relationship.kind {
                RelationKind::OneToMany => self.load_many(relationship, &ids).await?,
                RelationKind::Through => self.load_through(relationship, &ids).await?,
                RelationKind::OneToOne => continue,
            };

            tracing::debug!(
                table = self.hydrator.schema.table(),
                field = %relationship.field,
                parents = ids.len(),
                children = children.values().map(Vec::len).sum::<usize>(),
                "loaded batched relationship"
            );

            attach(&mut records, relationship, children)?;
        }

        tracing::debug!(
            table = self.hydrator.schema.table(),
            offset = self.offset + self.emitted,
            limit = remaining,
            rows = fetched,
            "fetched batch"
        );

        // A short page means the table is exhausted. Set only after every
        // side query has succeeded.
        if fetched < remaining {
            self.eof = true;
        }

        self.emitted += fetched;
        self.cached.extend(records);
        Ok(())
    }

    /// `SELECT child.* FROM child WHERE child.fk IN (ids) [AND filter]`
    async fn load_many(
        &self,
        relationship: &Relationship,
        ids: &[RawId],
    ) -> Result<HashMap<RawId, Vec<Box<dyn Record>>>> {
        let parent = &self.hydrator.schema;
        let (fk, _) = parent.foreign_key(&relationship.field).ok_or_else(|| {
            Error::invalid_relation(&relationship.field, "missing foreign key column")
        })?;

        let child = &relationship.schema;
        let fk_column = child.column(fk);

        let mut columns = bound_columns(child);
        let parent_index = match columns.iter().position(|bound| bound.column.name == fk) {
            Some(index) => index,
            None => {
                columns.push(BoundColumn {
                    owner: Owner::Root,
                    column: fk_column.column.clone(),
                });
                columns.len() - 1
            }
        };

        let projection = columns
            .iter()
            .map(|bound| ColumnRef::new(child.alias(), bound.column.clone()))
            .collect();

        let mut select = Select::new(child.table_ref(), Projection::Columns(projection));
        select.filter = fk_column
            .in_list(ids.iter().map(raw_value))
            .and_also(relationship.filter.clone().unwrap_or_default());
        select.order_by = vec![OrderBy {
            column: child.id_column(),
            direction: Direction::Asc,
        }];

        self.load_children(child, columns, parent_index, select).await
    }

    /// `SELECT child.*, join.left FROM child
    ///  INNER JOIN join ON join.right = child.id AND join.left IN (ids)`
    ///
    /// The child row has no column naming its parent, so the join table's
    /// left key is projected and scanned as a parent key.
    async fn load_through(
        &self,
        relationship: &Relationship,
        ids: &[RawId],
    ) -> Result<HashMap<RawId, Vec<Box<dyn Record>>>> {
        let parent = &self.hydrator.schema;
        let (left, right) = parent.foreign_keys(&relationship.field).ok_or_else(|| {
            Error::invalid_relation(&relationship.field, "missing join table columns")
        })?;
        let Some(intermediate) = &relationship.through else {
            return Err(Error::invalid_relation(
                &relationship.field,
                "missing intermediate schema",
            ));
        };

        let mut aliases = Aliases::default();
        let child = aliases.claim(&relationship.schema);
        let join = aliases.claim(&intermediate.schema);

        let mut columns = bound_columns(&child);
        let parent_index = columns.len();
        columns.push(BoundColumn {
            owner: Owner::Root,
            column: join.column(left).column,
        });

        let mut projection = child.column_refs();
        projection.push(join.column(left));

        let mut join_filter = join.column(left).in_list(ids.iter().map(raw_value));
        if let Some(filter) = &intermediate.filter {
            let mut filter = filter.clone();
            filter.realias(intermediate.schema.alias(), join.alias());
            join_filter = join_filter.and_also(filter);
        }

        let mut filter = relationship.filter.clone().unwrap_or_default();
        filter.realias(relationship.schema.alias(), child.alias());

        let mut select = Select::new(child.table_ref(), Projection::Columns(projection));
        select.joins.push(Join {
            kind: JoinKind::Inner,
            table: join.table_ref(),
            on: (join.column(right), child.id_column()),
            filter: join_filter,
        });
        select.filter = filter;
        select.order_by = vec![OrderBy {
            column: child.id_column(),
            direction: Direction::Asc,
        }];

        self.load_children(&child, columns, parent_index, select).await
    }

    /// Runs a side query and groups the hydrated children by the parent key
    /// found in column `parent_index`.
    async fn load_children(
        &self,
        child: &Schema,
        columns: Vec<BoundColumn>,
        parent_index: usize,
        select: Select,
    ) -> Result<HashMap<RawId, Vec<Box<dyn Record>>>> {
        let parent_kind = self.hydrator.schema.id_field().kind;
        let owns_parent_column = parent_index < child.columns().len();

        let hydrator = Hydrator {
            schema: child.clone(),
            columns: if owns_parent_column {
                columns
            } else {
                columns[..parent_index].to_vec()
            },
            joined: vec![],
            read_only: false,
        };

        let mut indexed: HashMap<RawId, Vec<Box<dyn Record>>> = HashMap::new();
        let mut rows = self.store.select_rows(select).await?;

        while let Some(row) = rows.next().await {
            let mut row = row?;
            let parent_id = scan_parent_id(parent_kind, &row, parent_index)?;
            if !owns_parent_column {
                row.truncate(parent_index);
            }

            let record = hydrator.hydrate(row)?;
            if let Some(parent_id) = parent_id {
                indexed.entry(parent_id).or_default().push(record);
            }
        }

        Ok(indexed)
    }
}

fn bound_columns(schema: &Schema) -> Vec<BoundColumn> {
    schema
        .columns()
        .iter()
        .map(|column| BoundColumn {
            owner: Owner::Root,
            column: column.clone(),
        })
        .collect()
}

fn scan_parent_id(kind: IdKind, row: &[Value], index: usize) -> Result<Option<RawId>> {
    let Some(value) = row.get(index) else {
        return Err(Error::invalid_result("row is missing the parent key column"));
    };
    Ok(kind.scan(value.clone())?.raw())
}

fn raw_value(id: &RawId) -> Value {
    match *id {
        RawId::Int(v) => Value::I64(v),
        RawId::Uuid(v) => Value::Uuid(v),
    }
}

/// Moves each parent's children into its relationship field. Parents without
/// children receive an empty list.
fn attach(
    records: &mut [Box<dyn Record>],
    relationship: &Relationship,
    mut children: HashMap<RawId, Vec<Box<dyn Record>>>,
) -> Result<()> {
    let filtered = relationship.filter.is_some()
        || relationship
            .through
            .as_ref()
            .is_some_and(|through| through.filter.is_some());

    for record in records {
        let related = record
            .id()
            .raw()
            .and_then(|id| children.remove(&id))
            .unwrap_or_default();

        record.set_relationship(&relationship.field, Related::Many(related))?;

        if filtered {
            record.set_writable(false);
        }
    }

    Ok(())
}
