use super::{Delete, Insert, Select, Update};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Statement {
    /// Name of the statement kind, as it appears in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Select(_) => "select",
            Statement::Insert(_) => "insert",
            Statement::Update(_) => "update",
            Statement::Delete(_) => "delete",
        }
    }

    /// The statement's target table.
    pub fn table(&self) -> &str {
        match self {
            Statement::Select(stmt) => &stmt.from.table,
            Statement::Insert(stmt) => &stmt.table,
            Statement::Update(stmt) => &stmt.table.table,
            Statement::Delete(stmt) => &stmt.from.table,
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, Statement::Select(_))
    }

    pub fn as_select(&self) -> Option<&Select> {
        match self {
            Statement::Select(stmt) => Some(stmt),
            _ => None,
        }
    }
}

impl From<Select> for Statement {
    fn from(value: Select) -> Self {
        Statement::Select(value)
    }
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Statement::Insert(value)
    }
}

impl From<Update> for Statement {
    fn from(value: Update) -> Self {
        Statement::Update(value)
    }
}

impl From<Delete> for Statement {
    fn from(value: Delete) -> Self {
        Statement::Delete(value)
    }
}
