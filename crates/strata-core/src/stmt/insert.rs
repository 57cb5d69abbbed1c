use super::Value;

/// `INSERT INTO table (columns) VALUES (values) RETURNING returning`
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,

    /// Columns to return from the inserted row. Used to read back
    /// database-assigned keys.
    pub returning: Vec<String>,
}
