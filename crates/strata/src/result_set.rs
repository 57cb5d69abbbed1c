use crate::compile::{BoundColumn, Compiled, Owner};
use crate::query::Relationship;

use strata_core::{
    record::Related,
    schema::Schema,
    stmt::{RowStream, Value},
    Error, Record, Result,
};

/// Streams the rows of a compiled `SELECT` and scans them into records.
///
/// ```ignore
/// while rows.next().await? {
///     let record = rows.get()?;
/// }
/// rows.close()?;
/// ```
#[derive(Debug)]
pub struct ResultSet {
    hydrator: Hydrator,

    /// `None` once the stream is exhausted or the set is closed.
    rows: Option<RowStream>,

    current: Option<Vec<Value>>,
    closed: bool,
}

/// Scans rows laid out as a compiled statement's bound columns into records.
#[derive(Debug, Clone)]
pub(crate) struct Hydrator {
    pub(crate) schema: Schema,
    pub(crate) columns: Vec<BoundColumn>,
    pub(crate) joined: Vec<Relationship>,

    /// Set when the statement had an explicit projection.
    pub(crate) read_only: bool,
}

impl ResultSet {
    pub(crate) fn new(schema: Schema, compiled: Compiled, read_only: bool, rows: RowStream) -> Self {
        Self {
            hydrator: Hydrator {
                schema,
                columns: compiled.columns,
                joined: compiled.joined,
                read_only,
            },
            rows: Some(rows),
            current: None,
            closed: false,
        }
    }

    /// Advances to the next row. Returns `false` once every row was read.
    pub async fn next(&mut self) -> Result<bool> {
        if self.closed {
            return Err(Error::already_closed("result set"));
        }

        let Some(rows) = self.rows.as_mut() else {
            self.current = None;
            return Ok(false);
        };

        match rows.next().await {
            Some(Ok(row)) => {
                self.current = Some(row);
                Ok(true)
            }
            Some(Err(err)) => {
                self.rows = None;
                self.current = None;
                Err(err)
            }
            None => {
                // Release the driver's cursor as soon as it is drained.
                self.rows = None;
                self.current = None;
                Ok(false)
            }
        }
    }

    /// Builds a record from the current row with the schema's factory.
    pub fn get(&self) -> Result<Box<dyn Record>> {
        let mut record = self.hydrator.schema.new_record();
        self.scan(&mut *record)?;
        Ok(record)
    }

    /// Scans the current row into an existing record.
    pub fn scan(&self, record: &mut dyn Record) -> Result<()> {
        let Some(row) = &self.current else {
            return Err(Error::invalid_result("no current row; call `next` first"));
        };
        self.hydrator.scan(row.clone(), record)
    }

    /// Closes the underlying cursor. Closing twice fails with `AlreadyClosed`.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::already_closed("result set"));
        }
        self.closed = true;
        self.rows = None;
        self.current = None;
        Ok(())
    }

    /// Reads every remaining row into records and closes the set.
    pub async fn collect(mut self) -> Result<Vec<Box<dyn Record>>> {
        let mut records = vec![];
        while self.next().await? {
            records.push(self.get()?);
        }
        self.close()?;
        Ok(records)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Hydrator {
    pub(crate) fn hydrate(&self, row: Vec<Value>) -> Result<Box<dyn Record>> {
        let mut record = self.schema.new_record();
        self.scan(row, &mut *record)?;
        Ok(record)
    }

    /// Scans `row` into `record`, dispatching joined columns to blank
    /// related records that are attached once the whole row is read.
    pub(crate) fn scan(&self, row: Vec<Value>, record: &mut dyn Record) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::invalid_result(format!(
                "expected {} columns, row has {}",
                self.columns.len(),
                row.len()
            )));
        }

        let mut related = self
            .joined
            .iter()
            .map(|relationship| record.new_relationship_record(&relationship.field))
            .collect::<Result<Vec<_>>>()?;

        for (bound, value) in self.columns.iter().zip(row) {
            match bound.owner {
                Owner::Root => record.scan_column(&bound.column, value)?,
                // An unmatched LEFT JOIN yields NULL for every related
                // column; the related record then keeps an unset id.
                Owner::Relation(_) if value.is_null() => {}
                Owner::Relation(i) => related[i].scan_column(&bound.column, value)?,
            }
        }

        for (relationship, mut child) in self.joined.iter().zip(related) {
            let value = if child.id().is_unset() {
                None
            } else {
                child.set_persisted();
                child.set_writable(true);
                Some(child)
            };
            record.set_relationship(&relationship.field, Related::One(value))?;
        }

        record.set_persisted();
        record.set_writable(!self.read_only);
        Ok(())
    }
}
