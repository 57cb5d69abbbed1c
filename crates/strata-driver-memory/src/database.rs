use crate::eval::{self, Scope};

use chrono::SubsecRound;
use indexmap::IndexMap;
use std::cmp::Ordering;
use strata_core::{
    driver::Response,
    schema::db::TableDef,
    stmt::{Delete, Insert, JoinKind, Projection, Select, Statement, Update, Value},
    Result,
};

pub(crate) type Row = IndexMap<String, Value>;

#[derive(Debug, Default, Clone)]
pub(crate) struct Database {
    tables: IndexMap<String, Table>,
}

#[derive(Debug, Clone)]
struct Table {
    def: TableDef,
    rows: Vec<Row>,

    /// Next value handed out for `BIGSERIAL` columns.
    next_id: i64,
}

impl Database {
    pub(crate) fn create_table(&mut self, def: &TableDef) -> Result<()> {
        if self.tables.contains_key(&def.name) {
            strata_core::bail!("relation \"{}\" already exists", def.name);
        }

        self.tables.insert(
            def.name.clone(),
            Table {
                def: def.clone(),
                rows: vec![],
                next_id: 1,
            },
        );
        Ok(())
    }

    pub(crate) fn exec(&mut self, stmt: &Statement) -> Result<Response> {
        match stmt {
            Statement::Select(select) => self.select(select),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
        }
    }

    fn table(&self, name: &str) -> Result<&Table> {
        match self.tables.get(name) {
            Some(table) => Ok(table),
            None => strata_core::bail!("relation \"{name}\" does not exist"),
        }
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        match self.tables.get_mut(name) {
            Some(table) => Ok(table),
            None => strata_core::bail!("relation \"{name}\" does not exist"),
        }
    }

    fn select(&self, stmt: &Select) -> Result<Response> {
        let root = self.table(&stmt.from.table)?;
        let mut scopes: Vec<Scope<'_>> = root
            .rows
            .iter()
            .map(|row| Scope::new(&stmt.from.alias, Some(row)))
            .collect();

        for join in &stmt.joins {
            let joined = self.table(&join.table.table)?;
            let mut next = Vec::with_capacity(scopes.len());

            for scope in scopes {
                let mut matched = false;

                for row in &joined.rows {
                    let candidate = scope.with(&join.table.alias, Some(row));
                    let (lhs, rhs) = &join.on;
                    let on = eval::compare(&candidate.resolve(lhs)?, &candidate.resolve(rhs)?)
                        == Some(Ordering::Equal);

                    if on && eval::condition(&join.filter, &candidate)? == Some(true) {
                        matched = true;
                        next.push(candidate);
                    }
                }

                if !matched && join.kind == JoinKind::Left {
                    next.push(scope.with(&join.table.alias, None));
                }
            }

            scopes = next;
        }

        let mut filtered = Vec::with_capacity(scopes.len());
        for scope in scopes {
            if eval::condition(&stmt.filter, &scope)? == Some(true) {
                filtered.push(scope);
            }
        }

        let columns = match &stmt.projection {
            Projection::Count => {
                let count = filtered.len() as i64;
                return Ok(Response::row_stream(vec![vec![Value::I64(count)]]));
            }
            Projection::Columns(columns) => columns,
        };

        if !stmt.order_by.is_empty() {
            // Resolve sort keys up front so that resolution errors surface
            // instead of being swallowed by the comparator.
            let mut keyed = Vec::with_capacity(filtered.len());
            for scope in filtered {
                let keys = stmt
                    .order_by
                    .iter()
                    .map(|order| scope.resolve(&order.column))
                    .collect::<Result<Vec<_>>>()?;
                keyed.push((keys, scope));
            }

            keyed.sort_by(|(a, _), (b, _)| {
                for ((lhs, rhs), order) in a.iter().zip(b).zip(&stmt.order_by) {
                    let ord = eval::sort_order(lhs, rhs, order.direction);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });

            filtered = keyed.into_iter().map(|(_, scope)| scope).collect();
        }

        let offset = usize::try_from(stmt.offset).unwrap_or(usize::MAX);
        let limit = match stmt.limit {
            0 => usize::MAX,
            limit => usize::try_from(limit).unwrap_or(usize::MAX),
        };

        let mut rows = vec![];
        for scope in filtered.into_iter().skip(offset).take(limit) {
            let row = columns
                .iter()
                .map(|column| scope.resolve(column))
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        Ok(Response::row_stream(rows))
    }

    fn insert(&mut self, stmt: &Insert) -> Result<Response> {
        if stmt.columns.len() != stmt.values.len() {
            strata_core::bail!(
                "INSERT has {} columns but {} values",
                stmt.columns.len(),
                stmt.values.len()
            );
        }

        let table = self.table_mut(&stmt.table)?;

        for column in &stmt.columns {
            if table.def.column(column).is_none() {
                strata_core::bail!(
                    "column \"{column}\" of relation \"{}\" does not exist",
                    table.def.name
                );
            }
        }

        let mut row = Row::new();

        for def in &table.def.columns {
            let provided = stmt
                .columns
                .iter()
                .position(|name| *name == def.name)
                .map(|i| stored(stmt.values[i].clone()));

            let value = match provided {
                Some(Value::Null) | None if def.ty.is_serial() => {
                    let id = table.next_id;
                    table.next_id += 1;
                    Value::I64(id)
                }
                Some(value) => {
                    if let (true, Some(id)) = (def.ty.is_serial(), value.as_i64()) {
                        table.next_id = table.next_id.max(id + 1);
                    }
                    value
                }
                None => Value::Null,
            };

            if value.is_null() && !def.nullable && !def.primary_key {
                strata_core::bail!(
                    "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                    def.name,
                    table.def.name
                );
            }

            if def.primary_key {
                let duplicate = table.rows.iter().any(|existing| {
                    existing
                        .get(&def.name)
                        .is_some_and(|v| eval::compare(v, &value) == Some(Ordering::Equal))
                });
                if duplicate {
                    strata_core::bail!(
                        "duplicate key value violates unique constraint \"{}_pkey\"",
                        table.def.name
                    );
                }
            }

            row.insert(def.name.clone(), value);
        }

        let returning = stmt
            .returning
            .iter()
            .map(|name| row.get(name).cloned().unwrap_or_default())
            .collect::<Vec<_>>();

        table.rows.push(row);

        if stmt.returning.is_empty() {
            Ok(Response::count(1))
        } else {
            Ok(Response::row_stream(vec![returning]))
        }
    }

    fn update(&mut self, stmt: &Update) -> Result<Response> {
        let table = self.table_mut(&stmt.table.table)?;

        for assignment in &stmt.assignments {
            if table.def.column(&assignment.column).is_none() {
                strata_core::bail!(
                    "column \"{}\" of relation \"{}\" does not exist",
                    assignment.column,
                    table.def.name
                );
            }
        }

        let mut matched = vec![];
        for (i, row) in table.rows.iter().enumerate() {
            let scope = Scope::new(&stmt.table.alias, Some(row));
            if eval::condition(&stmt.filter, &scope)? == Some(true) {
                matched.push(i);
            }
        }

        for &i in &matched {
            for assignment in &stmt.assignments {
                table.rows[i].insert(assignment.column.clone(), stored(assignment.value.clone()));
            }
        }

        Ok(Response::count(matched.len() as u64))
    }

    fn delete(&mut self, stmt: &Delete) -> Result<Response> {
        let table = self.table_mut(&stmt.from.table)?;

        let mut keep = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let scope = Scope::new(&stmt.from.alias, Some(row));
            keep.push(eval::condition(&stmt.filter, &scope)? != Some(true));
        }

        let before = table.rows.len();
        let mut flags = keep.into_iter();
        table.rows.retain(|_| flags.next().unwrap_or(true));

        Ok(Response::count((before - table.rows.len()) as u64))
    }
}

/// The value as PostgreSQL keeps it. Timestamps lose everything below a
/// microsecond.
fn stored(value: Value) -> Value {
    match value {
        Value::Timestamp(at) => Value::Timestamp(at.trunc_subsecs(6)),
        Value::Array(items) => Value::Array(items.into_iter().map(stored).collect()),
        value => value,
    }
}
