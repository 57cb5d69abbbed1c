use super::{Comma, Formatter, Ident, Params, ToSql};

use strata_core::schema::db::{ColumnDef, TableDef};

impl ToSql for &ColumnDef {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let ty = &self.ty.sql_name();
        fmt!(f, Ident(&self.name) " " ty);

        if self.primary_key {
            fmt!(f, " PRIMARY KEY");
        } else if !self.nullable {
            fmt!(f, " NOT NULL");
        }

        if let Some(reference) = &self.references {
            fmt!(f, " REFERENCES " Ident(&reference.table) " (" Ident(&reference.column) ")");
        }
    }
}

pub(super) fn create_table<T: Params>(table: &TableDef, f: &mut Formatter<'_, T>) {
    fmt!(f, "CREATE TABLE " Ident(&table.name) " (" Comma(&table.columns) ")");
}

pub(super) fn drop_table<T: Params>(table: &str, if_exists: bool, f: &mut Formatter<'_, T>) {
    fmt!(f, "DROP TABLE ");
    if if_exists {
        fmt!(f, "IF EXISTS ");
    }
    fmt!(f, Ident(table));
}

pub(super) fn add_column<T: Params>(table: &str, column: &ColumnDef, f: &mut Formatter<'_, T>) {
    fmt!(f, "ALTER TABLE " Ident(table) " ADD COLUMN " column);
}

pub(super) fn drop_column<T: Params>(table: &str, column: &str, f: &mut Formatter<'_, T>) {
    fmt!(f, "ALTER TABLE " Ident(table) " DROP COLUMN " Ident(column));
}
