use std::{
    fmt,
    sync::{Arc, Mutex},
};
use strata_core::{
    driver::operation::{Operation, Transaction},
    stmt::Statement,
};

/// Shared log of every operation a [`Memory`](crate::Memory) driver
/// executed, for asserting on query counts in tests.
#[derive(Clone, Default)]
pub struct ExecLog {
    ops: Arc<Mutex<Vec<Operation>>>,
}

impl ExecLog {
    pub(crate) fn push(&self, op: &Operation) {
        self.lock().push(op.clone());
    }

    /// Get the number of logged operations
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clear the log
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Remove and return the first operation from the log
    #[track_caller]
    pub fn pop(&self) -> Operation {
        let mut ops = self.lock();
        if ops.is_empty() {
            panic!("no operations in log");
        }
        ops.remove(0)
    }

    /// Every logged operation, oldest first
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().clone()
    }

    /// Every logged statement, skipping transaction control
    pub fn statements(&self) -> Vec<Statement> {
        self.lock()
            .iter()
            .filter_map(|op| op.as_query().cloned())
            .collect()
    }

    /// Number of `SELECT`s whose root table is `table`
    pub fn selects_on(&self, table: &str) -> usize {
        self.statements()
            .iter()
            .filter(|stmt| stmt.is_select() && stmt.table() == table)
            .count()
    }

    /// Number of transaction control operations of the given kind
    pub fn transactions(&self, kind: fn(&Transaction) -> bool) -> usize {
        self.lock()
            .iter()
            .filter(|op| matches!(op, Operation::Transaction(tx) if kind(tx)))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Operation>> {
        self.ops
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl fmt::Debug for ExecLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops = self.lock();
        f.debug_struct("ExecLog").field("ops", &*ops).finish()
    }
}
