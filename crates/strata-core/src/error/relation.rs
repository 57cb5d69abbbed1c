use super::Error;

/// Errors raised by the record protocol and by relationship declarations.
#[derive(Debug)]
pub(super) struct RelationError {
    kind: RelationErrorKind,
    name: Box<str>,
    detail: Option<Box<str>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelationErrorKind {
    UnknownColumn,
    NoSuchRelationship,
    WrongKind,
    InvalidRelation,
}

impl std::error::Error for RelationError {}

impl core::fmt::Display for RelationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.kind {
            RelationErrorKind::UnknownColumn => write!(f, "unknown column `{}`", self.name)?,
            RelationErrorKind::NoSuchRelationship => {
                write!(f, "no such relationship `{}`", self.name)?
            }
            RelationErrorKind::WrongKind => {
                write!(f, "wrong relationship kind for `{}`", self.name)?
            }
            RelationErrorKind::InvalidRelation => write!(f, "invalid relation `{}`", self.name)?,
        }

        if let Some(detail) = &self.detail {
            write!(f, "; {detail}")?;
        }

        Ok(())
    }
}

impl Error {
    /// The record protocol was asked for a column the record does not own.
    pub fn unknown_column(column: &str) -> Error {
        Error::relation(RelationErrorKind::UnknownColumn, column, None)
    }

    /// The record has no relationship with the given field name.
    pub fn no_such_relationship(field: &str) -> Error {
        Error::relation(RelationErrorKind::NoSuchRelationship, field, None)
    }

    /// A relationship setter received a value of the wrong cardinality or
    /// record type.
    pub fn wrong_kind(field: &str) -> Error {
        Error::relation(RelationErrorKind::WrongKind, field, None)
    }

    /// A query declared a relationship that contradicts the schema.
    pub fn invalid_relation(field: &str, detail: impl Into<String>) -> Error {
        Error::relation(
            RelationErrorKind::InvalidRelation,
            field,
            Some(detail.into().into_boxed_str()),
        )
    }

    pub fn is_unknown_column(&self) -> bool {
        self.is_relation(RelationErrorKind::UnknownColumn)
    }

    pub fn is_no_such_relationship(&self) -> bool {
        self.is_relation(RelationErrorKind::NoSuchRelationship)
    }

    pub fn is_wrong_kind(&self) -> bool {
        self.is_relation(RelationErrorKind::WrongKind)
    }

    pub fn is_invalid_relation(&self) -> bool {
        self.is_relation(RelationErrorKind::InvalidRelation)
    }

    fn relation(kind: RelationErrorKind, name: &str, detail: Option<Box<str>>) -> Error {
        Error::from(super::ErrorKind::Relation(RelationError {
            kind,
            name: name.into(),
            detail,
        }))
    }

    fn is_relation(&self, expected: RelationErrorKind) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Relation(err) if err.kind == expected))
    }
}
