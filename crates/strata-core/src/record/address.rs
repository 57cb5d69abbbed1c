use crate::{
    stmt::{FromValue, Value},
    Result,
};

use std::fmt;

/// A location a column value can be scanned into.
pub trait Scan {
    fn scan(&mut self, value: Value) -> Result<()>;
}

impl<T: FromValue> Scan for T {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = T::from_value(value)?;
        Ok(())
    }
}

/// A mutable borrow of one record field, handed out by
/// [`Record::column_address`](super::Record::column_address).
///
/// Nullable, array and JSON fields go through the `FromValue` impls of
/// `Option<T>`, `Vec<T>` and [`Json<T>`](crate::stmt::Json).
pub struct ColumnAddress<'a> {
    target: &'a mut dyn Scan,
}

impl<'a> ColumnAddress<'a> {
    pub fn new(target: &'a mut dyn Scan) -> Self {
        Self { target }
    }

    pub fn scan(self, value: Value) -> Result<()> {
        self.target.scan(value)
    }
}

impl fmt::Debug for ColumnAddress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ColumnAddress")
    }
}
