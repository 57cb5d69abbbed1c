use super::{ColumnRef, Condition, Direction};

/// A `SELECT` against one root table plus joins.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub projection: Projection,
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub filter: Condition,
    pub order_by: Vec<OrderBy>,
    pub offset: u64,

    /// Maximum number of rows; zero is unbounded.
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Columns(Vec<ColumnRef>),

    /// `COUNT(*)`, returned as a single `I64` row.
    Count,
}

/// `table AS alias`
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub table: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,

    /// Equality between a column of the joined table and a column already in
    /// scope.
    pub on: (ColumnRef, ColumnRef),

    /// Extra predicate folded into the `ON` clause.
    pub filter: Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Inner,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub direction: Direction,
}

impl Select {
    pub fn new(from: TableRef, projection: Projection) -> Self {
        Self {
            projection,
            from,
            joins: vec![],
            filter: Condition::TRUE,
            order_by: vec![],
            offset: 0,
            limit: 0,
        }
    }

    pub fn is_count(&self) -> bool {
        matches!(self.projection, Projection::Count)
    }

    pub fn columns(&self) -> &[ColumnRef] {
        match &self.projection {
            Projection::Columns(columns) => columns,
            Projection::Count => &[],
        }
    }
}

impl TableRef {
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
        }
    }
}
