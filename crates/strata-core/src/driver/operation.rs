mod transaction;
pub use transaction::{IsolationLevel, Transaction};

use crate::stmt::{Statement, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Execute a statement
    Query(Statement),

    /// Execute a transaction lifecycle op
    Transaction(Transaction),

    /// Execute literal SQL with positional parameters
    Raw { sql: String, params: Vec<Value> },
}

impl Operation {
    pub fn is_query(&self) -> bool {
        matches!(self, Operation::Query(_))
    }

    pub fn as_query(&self) -> Option<&Statement> {
        match self {
            Operation::Query(stmt) => Some(stmt),
            _ => None,
        }
    }
}

impl From<Statement> for Operation {
    fn from(value: Statement) -> Self {
        Operation::Query(value)
    }
}
