use super::{Formatter, Params, ToSql};

use strata_core::schema;

/// A table or column name, quoted when needed.
pub(super) struct Ident<S>(pub(super) S);

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        f.dst.push_str(&schema::ident(self.0.as_ref()));
    }
}
