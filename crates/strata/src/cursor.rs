use crate::{BatchingRunner, ResultSet};

use std::marker::PhantomData;
use strata_core::{Error, Record, Result};

/// The records of a query, read either straight from a [`ResultSet`] or
/// through a [`BatchingRunner`] when the query eager loads batched
/// relationships.
#[derive(Debug)]
pub enum RecordStream {
    Plain(ResultSet),
    Batched(BatchingRunner),
}

impl RecordStream {
    pub async fn next(&mut self) -> Result<bool> {
        match self {
            RecordStream::Plain(rows) => rows.next().await,
            RecordStream::Batched(runner) => runner.next().await,
        }
    }

    /// Returns the current record.
    pub fn get(&mut self) -> Result<Box<dyn Record>> {
        match self {
            RecordStream::Plain(rows) => rows.get(),
            RecordStream::Batched(runner) => runner.get(),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        match self {
            RecordStream::Plain(rows) => rows.close(),
            RecordStream::Batched(runner) => runner.close(),
        }
    }

    pub fn is_batched(&self) -> bool {
        matches!(self, RecordStream::Batched(_))
    }
}

/// Typed records of a query.
#[derive(Debug)]
pub struct Cursor<T> {
    records: RecordStream,
    _p: PhantomData<fn() -> T>,
}

impl<T: Record> Cursor<T> {
    pub(crate) fn new(records: RecordStream) -> Self {
        Self {
            records,
            _p: PhantomData,
        }
    }

    pub async fn next(&mut self) -> Option<Result<T>> {
        match self.records.next().await {
            Ok(true) => Some(self.records.get().and_then(downcast)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }

    /// Collects every remaining record and closes the cursor.
    pub async fn collect(mut self) -> Result<Vec<T>> {
        let mut ret = vec![];

        while let Some(res) = self.next().await {
            ret.push(res?);
        }

        self.records.close()?;
        Ok(ret)
    }

    pub fn close(&mut self) -> Result<()> {
        self.records.close()
    }

    pub fn into_inner(self) -> RecordStream {
        self.records
    }
}

pub(crate) fn downcast<T: Record>(record: Box<dyn Record>) -> Result<T> {
    let table = record.schema().table().to_string();
    record.downcast::<T>().map(|record| *record).ok_or_else(|| {
        Error::invalid_result(format!(
            "`{table}` record is not a `{}`",
            std::any::type_name::<T>()
        ))
    })
}
