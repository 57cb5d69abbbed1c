use super::{Comma, Formatter, Params, ToSql};

use strata_core::stmt::{BinaryOp, ColumnRef, Condition, Value};

impl ToSql for &ColumnRef {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        f.dst.push_str(&self.qualified_name());
    }
}

impl ToSql for &Condition {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        match self {
            Condition::Binary(op, column, Value::Null) if matches!(op, BinaryOp::Eq) => {
                fmt!(f, column " IS NULL")
            }
            Condition::Binary(op, column, Value::Null) if matches!(op, BinaryOp::Ne) => {
                fmt!(f, column " IS NOT NULL")
            }
            Condition::Binary(op, column, value) => {
                fmt!(f, column " " op.sql_op() " " value)
            }
            // An empty list must not match anything, and `IN ()` is not
            // valid SQL.
            Condition::In(_, values) if values.is_empty() => fmt!(f, "1=0"),
            Condition::In(column, values) => fmt!(f, column " IN (" Comma(values) ")"),
            Condition::NotIn(_, values) if values.is_empty() => fmt!(f, "1=1"),
            Condition::NotIn(column, values) => {
                fmt!(f, column " NOT IN (" Comma(values) ")")
            }
            Condition::IsNull(column) => fmt!(f, column " IS NULL"),
            Condition::IsNotNull(column) => fmt!(f, column " IS NOT NULL"),
            Condition::Like {
                column,
                pattern,
                case_insensitive,
            } => {
                let op = if *case_insensitive { " ILIKE " } else { " LIKE " };
                let pattern = &Value::String(pattern.clone());
                fmt!(f, column op pattern)
            }
            Condition::And(clauses) => junction(clauses, " AND ", "1=1", f),
            Condition::Or(clauses) => junction(clauses, " OR ", "1=0", f),
            Condition::Not(inner) => {
                let inner: &Condition = inner;
                fmt!(f, "NOT (" inner ")")
            }
            Condition::Array(op, column, values) => {
                let array = &Value::Array(values.clone());
                fmt!(f, column " " op.sql_op() " " array)
            }
            Condition::Regex(op, column, pattern) => {
                let pattern = &Value::String(pattern.clone());
                fmt!(f, column " " op.sql_op() " " pattern)
            }
            Condition::Json(op, column, value) => {
                fmt!(f, column " " op.sql_op() " " value)
            }
        }
    }
}

fn junction<T: Params>(
    clauses: &[Condition],
    delim: &str,
    empty: &str,
    f: &mut Formatter<'_, T>,
) {
    match clauses {
        [] => fmt!(f, empty),
        [clause] => fmt!(f, clause),
        clauses => {
            fmt!(f, "(");
            let mut s = "";
            for clause in clauses {
                fmt!(f, s clause);
                s = delim;
            }
            fmt!(f, ")");
        }
    }
}
