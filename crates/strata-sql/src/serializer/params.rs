use super::{Formatter, ToSql};

use strata_core::stmt;

/// Collects bound parameters while a statement is serialized.
pub trait Params {
    fn push(&mut self, param: &stmt::Value) -> Placeholder;
}

/// A 1-based positional parameter, rendered as `$n`.
pub struct Placeholder(pub usize);

impl Params for Vec<stmt::Value> {
    fn push(&mut self, value: &stmt::Value) -> Placeholder {
        self.push(value.clone());
        Placeholder(self.len())
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: super::Params>(self, f: &mut Formatter<'_, P>) {
        use std::fmt::Write;
        let _ = write!(f.dst, "${}", self.0);
    }
}

impl ToSql for &stmt::Value {
    fn to_sql<P: super::Params>(self, f: &mut Formatter<'_, P>) {
        let placeholder = f.params.push(self);
        placeholder.to_sql(f);
    }
}
