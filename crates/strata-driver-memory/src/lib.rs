mod database;
use database::Database;

mod eval;

mod exec_log;
pub use exec_log::ExecLog;

use std::{
    borrow::Cow,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use strata_core::{
    async_trait,
    driver::{
        operation::{Operation, Transaction},
        Connection, Driver, Response,
    },
    schema::db::ModelSchema,
    Result,
};

/// An in-process database that evaluates statements directly against
/// in-memory tables.
///
/// Every connection shares the same tables. Transactions snapshot the tables
/// on `BEGIN` and restore the snapshot on `ROLLBACK`. Every operation is
/// recorded in the driver's [`ExecLog`].
#[derive(Debug, Clone, Default)]
pub struct Memory {
    db: Arc<Mutex<Database>>,
    log: ExecLog,
}

#[derive(Debug)]
pub struct MemoryConnection {
    db: Arc<Mutex<Database>>,
    log: ExecLog,

    /// Tables as they were when the open transaction started.
    snapshot: Option<Database>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `memory://` URLs. Each call creates an independent database.
    pub fn from_url(url: &str) -> Result<Self> {
        if !url.starts_with("memory:") {
            strata_core::bail!("connection URL does not have a `memory` scheme; url={url}");
        }
        Ok(Self::new())
    }

    /// A handle to the log of operations executed by every connection.
    pub fn exec_log(&self) -> ExecLog {
        self.log.clone()
    }

    /// Removes all tables.
    pub fn reset(&self) {
        *lock(&self.db) = Database::default();
    }
}

#[async_trait]
impl Driver for Memory {
    fn url(&self) -> Cow<'_, str> {
        Cow::Borrowed("memory://")
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(MemoryConnection {
            db: self.db.clone(),
            log: self.log.clone(),
            snapshot: None,
        }))
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn exec(&mut self, op: Operation) -> Result<Response> {
        self.log.push(&op);

        match op {
            Operation::Query(stmt) => {
                tracing::debug!(
                    kind = stmt.kind_name(),
                    table = stmt.table(),
                    "executing statement"
                );
                lock(&self.db).exec(&stmt)
            }
            Operation::Transaction(Transaction::Start { .. }) => {
                if self.snapshot.is_some() {
                    strata_core::bail!("a transaction is already open on this connection");
                }
                self.snapshot = Some(lock(&self.db).clone());
                Ok(Response::count(0))
            }
            Operation::Transaction(Transaction::Commit) => {
                if self.snapshot.take().is_none() {
                    strata_core::bail!("no transaction is open on this connection");
                }
                Ok(Response::count(0))
            }
            Operation::Transaction(Transaction::Rollback) => {
                let Some(snapshot) = self.snapshot.take() else {
                    strata_core::bail!("no transaction is open on this connection");
                };
                *lock(&self.db) = snapshot;
                Ok(Response::count(0))
            }
            Operation::Raw { sql, .. } => {
                strata_core::bail!("the memory driver cannot execute raw SQL; sql={sql}")
            }
        }
    }

    async fn push_schema(&mut self, schema: &ModelSchema) -> Result<()> {
        let mut db = lock(&self.db);
        for table in &schema.tables {
            db.create_table(table)?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
