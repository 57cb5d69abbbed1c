use crate::{
    compile::{compile, compile_count},
    cursor::downcast,
    db::{Builder, Config, Pool},
    events,
    transaction::{Transaction, TxConnection},
    BatchingRunner, Cursor, Query, RecordStream, ResultSet, Result,
};

use async_recursion::async_recursion;
use std::{fmt, sync::Arc};
use strata_core::{
    driver::{
        operation::{IsolationLevel, Operation},
        Driver, Response,
    },
    record::{HookEvent, RecordState},
    schema::{Column, ForeignKey, SchemaRegistry},
    stmt::{
        Assignment, Condition, Delete, Identifier, Insert, RowStream, Select, Statement, Update,
        Value,
    },
    Error, Record, Schema,
};

/// State shared by a store and every store derived from it.
pub(crate) struct Shared {
    pub(crate) pool: Pool,
    pub(crate) registry: SchemaRegistry,
    pub(crate) config: Config,
}

/// Reads and writes records.
///
/// Cloning is cheap; clones share the connection pool. A store obtained from
/// a [`Transaction`] runs every operation on the transaction's connection.
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
    tx: Option<Arc<TxConnection>>,
}

impl Store {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Opens a store on the driver selected by the URL's scheme, with no
    /// registered schemas and default settings.
    pub async fn connect(url: &str) -> Result<Store> {
        Builder::default().connect(url).await
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Store {
        Store { shared, tx: None }
    }

    pub(crate) fn bind(&self, tx: Arc<TxConnection>) -> Store {
        Store {
            shared: self.shared.clone(),
            tx: Some(tx),
        }
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    pub(crate) fn tx(&self) -> Option<&Arc<TxConnection>> {
        self.tx.as_ref()
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.shared.registry
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn driver(&self) -> &dyn Driver {
        self.shared.pool.driver()
    }

    /// Creates the tables of every registered schema.
    pub async fn push_schema(&self) -> Result<()> {
        let schema = self.shared.registry.model_schema();
        tracing::debug!(tables = schema.tables.len(), "pushing schema");

        match &self.tx {
            Some(tx) => {
                let mut guard = tx.conn.lock().await;
                let Some(conn) = guard.as_mut() else {
                    return Err(Error::invalid_tx_callback());
                };
                conn.push_schema(&schema).await
            }
            None => self.shared.pool.get().await?.push_schema(&schema).await,
        }
    }

    pub(crate) async fn exec(&self, op: Operation) -> Result<Response> {
        if let Operation::Query(stmt) = &op {
            tracing::debug!(
                kind = stmt.kind_name(),
                table = stmt.table(),
                transaction = self.tx.is_some(),
                "executing statement"
            );
        }

        match &self.tx {
            Some(tx) => {
                let mut guard = tx.conn.lock().await;
                let Some(conn) = guard.as_mut() else {
                    return Err(Error::invalid_tx_callback());
                };
                conn.exec(op).await
            }
            None => self.shared.pool.get().await?.exec(op).await,
        }
    }

    pub(crate) async fn select_rows(&self, select: Select) -> Result<RowStream> {
        self.exec(Operation::Query(Statement::Select(select)))
            .await?
            .rows
            .into_values()
    }

    async fn exec_count(&self, stmt: Statement) -> Result<u64> {
        self.exec(Operation::Query(stmt)).await?.rows.into_count()
    }

    /// Runs `query`, returning a plain result set, or a batching runner when
    /// the query eager loads OneToMany or Through relationships.
    pub async fn find(&self, query: &Query) -> Result<RecordStream> {
        let compiled = compile(query)?;

        if query.is_batched() {
            let batch_size = match query.get_batch_size() {
                0 => self.shared.config.batch_size,
                batch_size => batch_size,
            };
            return Ok(RecordStream::Batched(BatchingRunner::new(
                self.clone(),
                query,
                compiled,
                batch_size,
            )));
        }

        let rows = self.select_rows(compiled.select.clone()).await?;
        Ok(RecordStream::Plain(ResultSet::new(
            query.schema().clone(),
            compiled,
            query.is_projected(),
            rows,
        )))
    }

    /// Runs `query` and reads its records as `T`.
    pub async fn all<T: Record>(&self, query: &Query) -> Result<Cursor<T>> {
        Ok(Cursor::new(self.find(query).await?))
    }

    /// Returns the first record `query` matches, or `RecordNotFound`.
    pub async fn find_one<T: Record>(&self, query: &Query) -> Result<T> {
        downcast(self.find_one_dyn(query).await?)
    }

    pub async fn find_one_dyn(&self, query: &Query) -> Result<Box<dyn Record>> {
        let mut query = query.copy();
        query.limit(1);

        let mut records = self.find(&query).await?;
        if !records.next().await? {
            return Err(Error::record_not_found(format!(
                "table={}",
                query.schema().table()
            )));
        }

        let record = records.get()?;
        records.close()?;
        Ok(record)
    }

    /// Counts the rows `query` matches, ignoring its order and window.
    pub async fn count(&self, query: &Query) -> Result<u64> {
        let select = compile_count(query)?;
        let rows = self.select_rows(select).await?.collect().await?;

        match rows.first().and_then(|row| row.first()) {
            Some(value) => match value.as_i64() {
                Some(count) => Ok(count.max(0) as u64),
                None => Err(Error::type_conversion(value.clone(), "u64")),
            },
            None => Err(Error::invalid_result("COUNT returned no rows")),
        }
    }

    /// Inserts a new record along with the children held in its relationship
    /// fields.
    pub async fn insert(&self, record: &mut dyn Record) -> Result<()> {
        if record.persisted() {
            return Err(Error::already_persisted(record.schema().table()));
        }
        self.write(record, vec![]).await
    }

    /// Updates a persisted record. A non-empty `columns` restricts the
    /// assignments to the named columns.
    pub async fn update(&self, record: &mut dyn Record, columns: &[&str]) -> Result<()> {
        check_updatable(record)?;
        let columns = columns.iter().map(|name| name.to_string()).collect();
        self.write(record, columns).await
    }

    /// Inserts the record if it is not persisted, updates it otherwise.
    /// Returns `true` when the record was updated.
    pub async fn save(&self, record: &mut dyn Record) -> Result<bool> {
        let was_persisted = record.persisted();
        if was_persisted {
            check_updatable(record)?;
        }
        self.write(record, vec![]).await?;
        Ok(was_persisted)
    }

    /// Writes the record tree, inside a transaction when there is more than
    /// one statement or an after-hook that may fail.
    async fn write(&self, record: &mut dyn Record, columns: Vec<String>) -> Result<()> {
        let transactional = !self.in_transaction()
            && (record.schema().hooks().has_after_write_events() || has_children(record)?);

        if !transactional {
            return self.write_tree(record, columns).await;
        }

        let mut saved = vec![];
        snapshot_tree(record, &mut saved)?;

        let tx = self.begin().await?;
        let res = tx.write_tree(&mut *record, columns).await;
        let res = tx.finish(res).await;

        // The rows are gone with the rollback; so are the keys and flags the
        // tree picked up while writing them.
        if res.is_err() {
            if let Err(err) = restore_tree(record, &mut saved.into_iter()) {
                tracing::warn!(error = %err, "could not restore record tree after rollback");
            }
        }

        res
    }

    #[async_recursion]
    async fn write_tree(&self, record: &mut dyn Record, columns: Vec<String>) -> Result<()> {
        let schema = record.schema();
        let was_persisted = record.persisted();

        events::apply_before_events(record)?;

        // Related records whose key this row references are written first.
        for (field, foreign_key) in schema.foreign_keys_map() {
            let ForeignKey::OneToOne {
                column,
                inverse: true,
            } = foreign_key
            else {
                continue;
            };

            let mut key = None;
            for child in relationship_records(record, field)? {
                self.write_tree(&mut *child, vec![]).await?;
                key = Some(child.id().to_value());
            }

            if let Some(key) = key {
                record.add_virtual_column(column, key);
            }
        }

        if was_persisted {
            self.update_row(record, &columns).await?;
        } else {
            self.insert_row(record).await?;
        }

        // Related records referencing this row get its key injected.
        let key = record.id().to_value();
        for (field, foreign_key) in schema.foreign_keys_map() {
            let column = match foreign_key {
                ForeignKey::OneToOne {
                    column,
                    inverse: false,
                }
                | ForeignKey::OneToMany { column } => column,
                _ => continue,
            };

            for child in relationship_records(record, field)? {
                child.add_virtual_column(column, key.clone());
                self.write_tree(&mut *child, vec![]).await?;
            }
        }

        events::apply_after_events(record, was_persisted)
    }

    async fn insert_row(&self, record: &mut dyn Record) -> Result<()> {
        let schema = record.schema();
        let id_field = schema.id_field();

        if record.id().is_unset() {
            if let Some(id) = id_field.kind.generate() {
                record.set_id(id);
            }
        }

        let assign_key = record.id().is_unset();
        let mut columns = vec![];
        let mut values = vec![];

        for column in schema.columns() {
            if assign_key && column.name == id_field.name {
                continue;
            }
            columns.push(column.name.clone());
            values.push(record.column_value(column)?);
        }

        let returning = if assign_key {
            vec![id_field.name.clone()]
        } else {
            vec![]
        };

        let insert = Insert {
            table: schema.table().to_string(),
            columns,
            values,
            returning,
        };

        let response = self.exec(Operation::Query(insert.into())).await?;

        if assign_key {
            let rows = response.rows.into_values()?.collect().await?;
            let Some(key) = rows.into_iter().next().and_then(|row| row.into_iter().next()) else {
                return Err(Error::invalid_result("INSERT returned no key"));
            };
            record.set_id(id_field.kind.scan(key)?);
        }

        record.set_persisted();
        record.set_writable(true);
        Ok(())
    }

    async fn update_row(&self, record: &mut dyn Record, names: &[String]) -> Result<()> {
        let schema = record.schema();
        let id_name = &schema.id_field().name;

        let columns: Vec<&Column> = if names.is_empty() {
            schema
                .columns()
                .iter()
                .filter(|column| column.name != *id_name)
                .collect()
        } else {
            names
                .iter()
                .map(|name| {
                    schema
                        .find_column(name)
                        .ok_or_else(|| Error::unknown_column(name))
                })
                .collect::<Result<_>>()?
        };

        let assignments = columns
            .into_iter()
            .map(|column| Ok(Assignment::new(&column.name, record.column_value(column)?)))
            .collect::<Result<Vec<_>>>()?;

        if assignments.is_empty() {
            return Ok(());
        }

        let update = Update {
            table: schema.table_ref(),
            assignments,
            filter: schema.id_column().eq(record.id().to_value()),
        };

        if self.exec_count(update.into()).await? == 0 {
            return Err(Error::record_not_found(format!(
                "table={} id={}",
                schema.table(),
                record.id()
            )));
        }

        Ok(())
    }

    /// Deletes a persisted record. Runs inside a transaction when the schema
    /// declares `AfterDelete`.
    pub async fn delete(&self, record: &mut dyn Record) -> Result<()> {
        if !record.persisted() {
            return Err(Error::not_persisted(record.schema().table()));
        }

        let schema = record.schema();
        if self.in_transaction() || !schema.hooks().has(HookEvent::AfterDelete) {
            return self.delete_row(record).await;
        }

        let tx = self.begin().await?;
        let res = tx.delete_row(&mut *record).await;
        let res = tx.finish(res).await;

        if res.is_err() {
            record.set_persisted();
        }

        res
    }

    async fn delete_row(&self, record: &mut dyn Record) -> Result<()> {
        let schema = record.schema();
        events::apply_before_delete(record)?;

        let delete = Delete {
            from: schema.table_ref(),
            filter: schema.id_column().eq(record.id().to_value()),
        };

        if self.exec_count(delete.into()).await? == 0 {
            return Err(Error::record_not_found(format!(
                "table={} id={}",
                schema.table(),
                record.id()
            )));
        }

        record.state_mut().persisted = false;
        events::apply_after_delete(record)
    }

    /// Re-reads every column of a persisted record. The record becomes
    /// writable again.
    pub async fn reload(&self, record: &mut dyn Record) -> Result<()> {
        if !record.persisted() {
            return Err(Error::not_persisted(record.schema().table()));
        }

        let schema = record.schema();
        let mut query = Query::new(schema.clone());
        query
            .filter(schema.id_column().eq(record.id().to_value()))
            .limit(1);

        let compiled = compile(&query)?;
        let rows = self.select_rows(compiled.select.clone()).await?;
        let mut rows = ResultSet::new(schema.clone(), compiled, false, rows);

        if !rows.next().await? {
            rows.close()?;
            return Err(Error::record_not_found(format!(
                "table={} id={}",
                schema.table(),
                record.id()
            )));
        }

        rows.scan(record)?;
        rows.close()
    }

    /// Deletes every row matching `filter`. A tautological filter fails with
    /// `EmptyRawQuery`.
    pub async fn delete_where(&self, schema: &Schema, filter: Condition) -> Result<u64> {
        if filter.is_true() {
            return Err(Error::empty_raw_query(schema.table()));
        }

        let delete = Delete {
            from: schema.table_ref(),
            filter,
        };
        self.exec_count(delete.into()).await
    }

    /// Applies `assignments` to every row matching `filter`. A tautological
    /// filter fails with `EmptyRawQuery`.
    pub async fn update_where(
        &self,
        schema: &Schema,
        assignments: Vec<Assignment>,
        filter: Condition,
    ) -> Result<u64> {
        if filter.is_true() {
            return Err(Error::empty_raw_query(schema.table()));
        }

        let update = Update {
            table: schema.table_ref(),
            assignments,
            filter,
        };
        self.exec_count(update.into()).await
    }

    /// Sends literal SQL to the driver. Returns the affected or returned row
    /// count.
    pub async fn raw_exec(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        if sql.trim().is_empty() {
            return Err(Error::empty_raw_query("raw SQL"));
        }

        let response = self
            .exec(Operation::Raw {
                sql: sql.to_string(),
                params,
            })
            .await?;

        if response.rows.is_count() {
            return response.rows.into_count();
        }
        let rows = response.rows.into_values()?.collect().await?;
        Ok(rows.len() as u64)
    }

    /// Opens a transaction. Inside a transaction this returns a nested
    /// handle sharing the outer one.
    pub async fn begin(&self) -> Result<Transaction> {
        Transaction::begin(self, None, false).await
    }

    /// Opens a transaction at the given isolation level. Batched reads run
    /// under `RepeatableRead` see one snapshot across all their queries.
    pub async fn begin_with(&self, isolation: IsolationLevel) -> Result<Transaction> {
        Transaction::begin(self, Some(isolation), false).await
    }

    /// Runs `f` with a store bound to a new transaction, committing when it
    /// returns `Ok` and rolling back otherwise or when the configured
    /// timeout elapses. Inside a transaction `f` runs on the current one.
    pub async fn transaction<O>(&self, f: impl AsyncFnOnce(&Store) -> Result<O>) -> Result<O> {
        if self.in_transaction() {
            return f(self).await;
        }

        let timeout = self.shared.config.transaction_timeout;
        let tx = self.begin().await?;

        let Ok(res) = tokio::time::timeout(timeout, f(tx.store())).await else {
            tracing::warn!(?timeout, "transaction timed out");
            tx.rollback().await?;
            return Err(Error::transaction_timed_out(timeout));
        };

        tx.finish(res).await
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("driver", &self.shared.pool.driver())
            .field("tables", &self.shared.registry.len())
            .field("in_transaction", &self.tx.is_some())
            .finish()
    }
}

fn check_updatable(record: &dyn Record) -> Result<()> {
    if !record.persisted() {
        return Err(Error::not_persisted(record.schema().table()));
    }
    if !record.writable() {
        return Err(Error::not_writable(record.schema().table()));
    }
    Ok(())
}

/// The records held by a relationship field. Records that do not expose the
/// field hold none.
fn relationship_records<'a>(
    record: &'a mut dyn Record,
    field: &str,
) -> Result<Vec<&'a mut dyn Record>> {
    match record.relationship_records(field) {
        Err(err) if err.is_no_such_relationship() => Ok(vec![]),
        res => res,
    }
}

/// Records the id and state of every record in the tree `write_tree` walks,
/// in the order it walks them.
fn snapshot_tree(
    record: &mut dyn Record,
    saved: &mut Vec<(Identifier, RecordState)>,
) -> Result<()> {
    saved.push((record.id(), record.state().clone()));

    let schema = record.schema();
    for (field, foreign_key) in schema.foreign_keys_map() {
        if matches!(foreign_key, ForeignKey::Through { .. }) {
            continue;
        }
        for child in relationship_records(record, field)? {
            snapshot_tree(child, saved)?;
        }
    }
    Ok(())
}

fn restore_tree(
    record: &mut dyn Record,
    saved: &mut impl Iterator<Item = (Identifier, RecordState)>,
) -> Result<()> {
    let Some((id, state)) = saved.next() else {
        return Err(Error::invalid_result("record tree changed while writing"));
    };
    record.set_id(id);
    *record.state_mut() = state;

    let schema = record.schema();
    for (field, foreign_key) in schema.foreign_keys_map() {
        if matches!(foreign_key, ForeignKey::Through { .. }) {
            continue;
        }
        for child in relationship_records(record, field)? {
            restore_tree(child, saved)?;
        }
    }
    Ok(())
}

fn has_children(record: &mut dyn Record) -> Result<bool> {
    let schema = record.schema();
    for (field, foreign_key) in schema.foreign_keys_map() {
        if matches!(foreign_key, ForeignKey::Through { .. }) {
            continue;
        }
        if !relationship_records(record, field)?.is_empty() {
            return Ok(true);
        }
    }
    Ok(false)
}
