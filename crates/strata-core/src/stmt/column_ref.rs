use crate::schema::{Column, JsonCast, JsonPath};

use std::fmt;

/// A column qualified by the alias of the table it is read from.
///
/// An empty alias renders the bare column name.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table_alias: String,
    pub column: Column,
}

impl ColumnRef {
    pub fn new(table_alias: impl Into<String>, column: Column) -> Self {
        Self {
            table_alias: table_alias.into(),
            column,
        }
    }

    /// References a column by name without a table alias.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(String::new(), Column::untyped(name))
    }

    pub fn name(&self) -> &str {
        &self.column.name
    }

    pub fn qualified_name(&self) -> String {
        self.column.qualified_name(&self.table_alias)
    }

    /// Addresses a key path inside this JSON column.
    pub fn json_path<I, S>(&self, keys: I, cast: JsonCast) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut column = self.column.clone();
        column.json = Some(JsonPath {
            keys: keys.into_iter().map(Into::into).collect(),
            cast,
        });
        Self::new(self.table_alias.clone(), column)
    }

    /// Returns a copy of this reference read from a differently aliased
    /// table.
    pub fn with_alias(&self, alias: &str) -> Self {
        Self::new(alias, self.column.clone())
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}
