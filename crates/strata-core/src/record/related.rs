use super::Record;
use crate::{Error, Result};

/// Records loaded for a relationship field.
#[derive(Debug)]
pub enum Related {
    /// OneToOne: the related record, if one matched.
    One(Option<Box<dyn Record>>),

    /// OneToMany and Through: every related record, in query order.
    Many(Vec<Box<dyn Record>>),
}

impl Related {
    /// Unpacks a OneToOne value of concrete type `T`.
    ///
    /// Fails with `WrongKind` when the value is a list or holds another
    /// record type.
    pub fn into_one<T: Record>(self, field: &str) -> Result<Option<T>> {
        match self {
            Related::One(None) => Ok(None),
            Related::One(Some(record)) => record
                .downcast::<T>()
                .map(|record| Some(*record))
                .ok_or_else(|| Error::wrong_kind(field)),
            Related::Many(_) => Err(Error::wrong_kind(field)),
        }
    }

    /// Unpacks a list of records of concrete type `T`.
    pub fn into_many<T: Record>(self, field: &str) -> Result<Vec<T>> {
        match self {
            Related::Many(records) => records
                .into_iter()
                .map(|record| {
                    record
                        .downcast::<T>()
                        .map(|record| *record)
                        .ok_or_else(|| Error::wrong_kind(field))
                })
                .collect(),
            Related::One(_) => Err(Error::wrong_kind(field)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Related::One(record) => usize::from(record.is_some()),
            Related::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
