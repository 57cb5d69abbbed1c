mod batch;
pub use batch::BatchingRunner;

pub mod compile;

mod cursor;
pub use cursor::{Cursor, RecordStream};

pub mod db;
pub use db::{Builder, Config};

pub mod events;

mod query;
pub use query::{Intermediate, Query, Relationship};

mod result_set;
pub use result_set::ResultSet;

mod store;
pub use store::Store;

mod transaction;
pub use transaction::Transaction;

pub use strata_core::{bail, driver, err, record, schema, stmt, Error, Record, Result, Schema};
