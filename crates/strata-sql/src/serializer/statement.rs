use super::{Comma, Formatter, Ident, Params, ToSql};

use strata_core::stmt::{
    Assignment, Delete, Insert, Join, JoinKind, OrderBy, Projection, Select, Statement, TableRef,
    Update,
};

impl ToSql for &Statement {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        match self {
            Statement::Select(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::Update(stmt) => stmt.to_sql(f),
            Statement::Delete(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &TableRef {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        fmt!(f, Ident(&self.table));
        if !self.alias.is_empty() {
            fmt!(f, " AS " Ident(&self.alias));
        }
    }
}

impl ToSql for &Select {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        fmt!(f, "SELECT ");

        match &self.projection {
            Projection::Columns(columns) => fmt!(f, Comma(columns)),
            Projection::Count => fmt!(f, "COUNT(*)"),
        }

        let from = &self.from;
        fmt!(f, " FROM " from);

        for join in &self.joins {
            fmt!(f, join);
        }

        let filter = &self.filter;
        if !filter.is_true() {
            fmt!(f, " WHERE " filter);
        }

        if !self.order_by.is_empty() {
            fmt!(f, " ORDER BY " Comma(&self.order_by));
        }

        if self.offset > 0 {
            fmt!(f, " OFFSET " self.offset);
        }

        if self.limit > 0 {
            fmt!(f, " LIMIT " self.limit);
        }
    }
}

impl ToSql for &Join {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let kind = match self.kind {
            JoinKind::Left => " LEFT JOIN ",
            JoinKind::Inner => " INNER JOIN ",
        };
        let (lhs, rhs) = &self.on;

        let table = &self.table;
        fmt!(f, kind table " ON " lhs " = " rhs);

        let filter = &self.filter;
        if !filter.is_true() {
            fmt!(f, " AND " filter);
        }
    }
}

impl ToSql for &OrderBy {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        fmt!(f, &self.column " " self.direction.sql_name());
    }
}

impl ToSql for &Insert {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        fmt!(f, "INSERT INTO " Ident(&self.table));

        if self.columns.is_empty() {
            fmt!(f, " DEFAULT VALUES");
        } else {
            let columns = Comma(self.columns.iter().map(Ident));
            fmt!(f, " (" columns ") VALUES (" Comma(&self.values) ")");
        }

        if !self.returning.is_empty() {
            let returning = Comma(self.returning.iter().map(Ident));
            fmt!(f, " RETURNING " returning);
        }
    }
}

impl ToSql for &Assignment {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let value = &self.value;
        fmt!(f, Ident(&self.column) " = " value);
    }
}

impl ToSql for &Update {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let table = &self.table;
        fmt!(f, "UPDATE " table " SET " Comma(&self.assignments));

        let filter = &self.filter;
        if !filter.is_true() {
            fmt!(f, " WHERE " filter);
        }
    }
}

impl ToSql for &Delete {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let from = &self.from;
        fmt!(f, "DELETE FROM " from);

        let filter = &self.filter;
        if !filter.is_true() {
            fmt!(f, " WHERE " filter);
        }
    }
}
