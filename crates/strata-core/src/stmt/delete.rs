use super::{Condition, TableRef};

/// `DELETE FROM table AS alias WHERE filter`
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub from: TableRef,
    pub filter: Condition,
}
