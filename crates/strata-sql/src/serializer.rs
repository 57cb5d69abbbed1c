#[macro_use]
mod fmt;
use fmt::ToSql;

mod condition;

mod ddl;

mod delim;
use delim::Comma;

mod ident;
use ident::Ident;

mod params;
pub use params::{Params, Placeholder};

mod statement;

use strata_core::{
    driver::operation::Transaction,
    schema::db::{ColumnDef, TableDef},
    stmt::{Condition, Statement},
};

/// Serializes statements to PostgreSQL SQL with `$n` placeholders.
///
/// Parameters are pushed to `params` in the order their placeholders appear
/// in the text, so pre-built conditions are renumbered as they are composed.
#[derive(Debug, Default)]
pub struct Serializer {
    _priv: (),
}

struct Formatter<'a, T> {
    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,
}

impl Serializer {
    pub fn postgresql() -> Serializer {
        Serializer { _priv: () }
    }

    pub fn serialize(&self, stmt: &Statement, params: &mut impl Params) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            dst: &mut ret,
            params,
        };

        stmt.to_sql(&mut fmt);
        ret
    }

    /// Serializes a standalone predicate, as used in a `WHERE` clause.
    pub fn serialize_condition(&self, cond: &Condition, params: &mut impl Params) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            dst: &mut ret,
            params,
        };

        cond.to_sql(&mut fmt);
        ret
    }

    /// Serialize a transaction control operation to a SQL string.
    pub fn serialize_transaction(&self, op: &Transaction) -> String {
        match op {
            Transaction::Start {
                isolation,
                read_only,
            } => {
                let mut sql = String::from("BEGIN");
                if let Some(level) = isolation {
                    sql.push_str(" ISOLATION LEVEL ");
                    sql.push_str(level.sql_name());
                }
                if *read_only {
                    sql.push_str(" READ ONLY");
                }
                sql
            }
            Transaction::Commit => "COMMIT".to_string(),
            Transaction::Rollback => "ROLLBACK".to_string(),
        }
    }

    pub fn create_table(&self, table: &TableDef) -> String {
        self.ddl(|f| ddl::create_table(table, f))
    }

    pub fn drop_table(&self, table: &str, if_exists: bool) -> String {
        self.ddl(|f| ddl::drop_table(table, if_exists, f))
    }

    pub fn add_column(&self, table: &str, column: &ColumnDef) -> String {
        self.ddl(|f| ddl::add_column(table, column, f))
    }

    pub fn drop_column(&self, table: &str, column: &str) -> String {
        self.ddl(|f| ddl::drop_column(table, column, f))
    }

    fn ddl(&self, f: impl FnOnce(&mut Formatter<'_, NoParams>)) -> String {
        let mut ret = String::new();
        let mut params = NoParams;

        let mut fmt = Formatter {
            dst: &mut ret,
            params: &mut params,
        };

        f(&mut fmt);
        ret
    }
}

/// DDL statements never bind parameters.
struct NoParams;

impl Params for NoParams {
    fn push(&mut self, _value: &strata_core::stmt::Value) -> Placeholder {
        Placeholder(0)
    }
}
