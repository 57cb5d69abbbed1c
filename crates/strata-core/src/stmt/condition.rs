use super::{ColumnRef, Value};

use std::fmt;

/// A composable predicate over columns.
///
/// Conditions are plain data. The SQL serializer renders them to a fragment
/// with positional placeholders and the in-memory driver evaluates them
/// directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column <op> value`
    Binary(BinaryOp, ColumnRef, Value),

    /// `column IN (...)`. An empty list never matches.
    In(ColumnRef, Vec<Value>),

    /// `column NOT IN (...)`. An empty list always matches.
    NotIn(ColumnRef, Vec<Value>),

    IsNull(ColumnRef),

    IsNotNull(ColumnRef),

    /// `column LIKE pattern`, or `ILIKE` when case-insensitive.
    Like {
        column: ColumnRef,
        pattern: String,
        case_insensitive: bool,
    },

    /// All clauses hold. Zero clauses is a tautology.
    And(Vec<Condition>),

    /// Any clause holds. Zero clauses is a contradiction.
    Or(Vec<Condition>),

    Not(Box<Condition>),

    /// PostgreSQL array operator against an array bound as one parameter.
    Array(ArrayOp, ColumnRef, Vec<Value>),

    /// POSIX regular expression match.
    Regex(RegexOp, ColumnRef, String),

    /// JSON document operator.
    Json(JsonOp, ColumnRef, Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Contains,
    ContainedBy,
    Overlap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexOp {
    Match,
    MatchInsensitive,
    NotMatch,
    NotMatchInsensitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonOp {
    /// `@>`
    Contains,
    /// `<@`
    ContainedBy,
    /// `?`
    HasKey,
    /// `?|`
    HasAnyKey,
    /// `?&`
    HasAllKeys,
}

impl Condition {
    /// The tautology, used as the default predicate of a query.
    pub const TRUE: Condition = Condition::And(Vec::new());

    /// The contradiction.
    pub const FALSE: Condition = Condition::Or(Vec::new());

    pub fn eq(column: ColumnRef, value: impl Into<Value>) -> Self {
        Self::Binary(BinaryOp::Eq, column, value.into())
    }

    pub fn neq(column: ColumnRef, value: impl Into<Value>) -> Self {
        Self::Binary(BinaryOp::Ne, column, value.into())
    }

    pub fn lt(column: ColumnRef, value: impl Into<Value>) -> Self {
        Self::Binary(BinaryOp::Lt, column, value.into())
    }

    pub fn gt(column: ColumnRef, value: impl Into<Value>) -> Self {
        Self::Binary(BinaryOp::Gt, column, value.into())
    }

    pub fn lt_or_eq(column: ColumnRef, value: impl Into<Value>) -> Self {
        Self::Binary(BinaryOp::Le, column, value.into())
    }

    pub fn gt_or_eq(column: ColumnRef, value: impl Into<Value>) -> Self {
        Self::Binary(BinaryOp::Ge, column, value.into())
    }

    pub fn in_list<I, V>(column: ColumnRef, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In(column, values.into_iter().map(Into::into).collect())
    }

    pub fn not_in_list<I, V>(column: ColumnRef, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::NotIn(column, values.into_iter().map(Into::into).collect())
    }

    pub fn like(column: ColumnRef, pattern: impl Into<String>) -> Self {
        Self::Like {
            column,
            pattern: pattern.into(),
            case_insensitive: false,
        }
    }

    pub fn ilike(column: ColumnRef, pattern: impl Into<String>) -> Self {
        Self::Like {
            column,
            pattern: pattern.into(),
            case_insensitive: true,
        }
    }

    pub fn array<I, V>(op: ArrayOp, column: ColumnRef, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Array(op, column, values.into_iter().map(Into::into).collect())
    }

    pub fn regex(op: RegexOp, column: ColumnRef, pattern: impl Into<String>) -> Self {
        Self::Regex(op, column, pattern.into())
    }

    pub fn json(op: JsonOp, column: ColumnRef, value: impl Into<Value>) -> Self {
        Self::Json(op, column, value.into())
    }

    pub fn and(clauses: impl IntoIterator<Item = Condition>) -> Self {
        Self::And(clauses.into_iter().collect())
    }

    pub fn or(clauses: impl IntoIterator<Item = Condition>) -> Self {
        Self::Or(clauses.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not(Box::new(condition))
    }

    /// True for the empty conjunction.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::And(clauses) if clauses.is_empty())
    }

    /// True for the empty disjunction.
    pub fn is_false(&self) -> bool {
        matches!(self, Self::Or(clauses) if clauses.is_empty())
    }

    /// Conjoins `other` onto `self`, flattening nested `And`s and dropping
    /// tautologies.
    pub fn and_also(self, other: Condition) -> Condition {
        match (self, other) {
            (lhs, rhs) if rhs.is_true() => lhs,
            (lhs, rhs) if lhs.is_true() => rhs,
            (Condition::And(mut lhs), Condition::And(rhs)) => {
                lhs.extend(rhs);
                Condition::And(lhs)
            }
            (Condition::And(mut lhs), rhs) => {
                lhs.push(rhs);
                Condition::And(lhs)
            }
            (lhs, rhs) => Condition::And(vec![lhs, rhs]),
        }
    }

    /// Visits every column referenced by the condition.
    pub fn columns_mut(&mut self, f: &mut impl FnMut(&mut ColumnRef)) {
        match self {
            Self::Binary(_, column, _)
            | Self::In(column, _)
            | Self::NotIn(column, _)
            | Self::IsNull(column)
            | Self::IsNotNull(column)
            | Self::Like { column, .. }
            | Self::Array(_, column, _)
            | Self::Regex(_, column, _)
            | Self::Json(_, column, _) => f(column),
            Self::And(clauses) | Self::Or(clauses) => {
                for clause in clauses {
                    clause.columns_mut(f);
                }
            }
            Self::Not(inner) => inner.columns_mut(f),
        }
    }

    /// Moves every reference to the table aliased `from` onto `to`.
    pub fn realias(&mut self, from: &str, to: &str) {
        self.columns_mut(&mut |column| {
            if column.table_alias == from {
                column.table_alias = to.to_string();
            }
        });
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::TRUE
    }
}

impl BinaryOp {
    pub fn sql_op(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }
}

impl ArrayOp {
    pub fn sql_op(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Contains => "@>",
            Self::ContainedBy => "<@",
            Self::Overlap => "&&",
        }
    }
}

impl RegexOp {
    pub fn sql_op(self) -> &'static str {
        match self {
            Self::Match => "~",
            Self::MatchInsensitive => "~*",
            Self::NotMatch => "!~",
            Self::NotMatchInsensitive => "!~*",
        }
    }

    pub fn is_case_insensitive(self) -> bool {
        matches!(self, Self::MatchInsensitive | Self::NotMatchInsensitive)
    }

    pub fn is_negated(self) -> bool {
        matches!(self, Self::NotMatch | Self::NotMatchInsensitive)
    }
}

impl JsonOp {
    pub fn sql_op(self) -> &'static str {
        match self {
            Self::Contains => "@>",
            Self::ContainedBy => "<@",
            Self::HasKey => "?",
            Self::HasAnyKey => "?|",
            Self::HasAllKeys => "?&",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_op())
    }
}

/// Condition constructors on column references, so that predicates read
/// left to right: `people.column("age").gt(21)`.
impl ColumnRef {
    pub fn eq(&self, value: impl Into<Value>) -> Condition {
        Condition::eq(self.clone(), value)
    }

    pub fn neq(&self, value: impl Into<Value>) -> Condition {
        Condition::neq(self.clone(), value)
    }

    pub fn lt(&self, value: impl Into<Value>) -> Condition {
        Condition::lt(self.clone(), value)
    }

    pub fn gt(&self, value: impl Into<Value>) -> Condition {
        Condition::gt(self.clone(), value)
    }

    pub fn lt_or_eq(&self, value: impl Into<Value>) -> Condition {
        Condition::lt_or_eq(self.clone(), value)
    }

    pub fn gt_or_eq(&self, value: impl Into<Value>) -> Condition {
        Condition::gt_or_eq(self.clone(), value)
    }

    pub fn in_list<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::in_list(self.clone(), values)
    }

    pub fn not_in_list<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::not_in_list(self.clone(), values)
    }

    pub fn is_null(&self) -> Condition {
        Condition::IsNull(self.clone())
    }

    pub fn is_not_null(&self) -> Condition {
        Condition::IsNotNull(self.clone())
    }

    pub fn like(&self, pattern: impl Into<String>) -> Condition {
        Condition::like(self.clone(), pattern)
    }

    pub fn ilike(&self, pattern: impl Into<String>) -> Condition {
        Condition::ilike(self.clone(), pattern)
    }

    pub fn matches(&self, pattern: impl Into<String>) -> Condition {
        Condition::regex(RegexOp::Match, self.clone(), pattern)
    }

    pub fn contains<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::array(ArrayOp::Contains, self.clone(), values)
    }

    pub fn contained_by<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::array(ArrayOp::ContainedBy, self.clone(), values)
    }

    pub fn overlaps<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::array(ArrayOp::Overlap, self.clone(), values)
    }
}
