use super::Error;

/// Error when a write is attempted on a record whose lifecycle state does not
/// allow it.
#[derive(Debug)]
pub(super) struct RecordStateError {
    kind: RecordStateErrorKind,
    table: Box<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordStateErrorKind {
    NotWritable,
    NotPersisted,
    AlreadyPersisted,
}

impl std::error::Error for RecordStateError {}

impl core::fmt::Display for RecordStateError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let msg = match self.kind {
            RecordStateErrorKind::NotWritable => "record is not writable",
            RecordStateErrorKind::NotPersisted => "record is not persisted",
            RecordStateErrorKind::AlreadyPersisted => "record is already persisted",
        };
        write!(f, "{msg}: {}", self.table)
    }
}

impl Error {
    /// An update was attempted on a record loaded with a partial projection
    /// or through a filtered relationship.
    pub fn not_writable(table: &str) -> Error {
        Error::record_state(RecordStateErrorKind::NotWritable, table)
    }

    /// An update or delete was attempted on a record that was never inserted.
    pub fn not_persisted(table: &str) -> Error {
        Error::record_state(RecordStateErrorKind::NotPersisted, table)
    }

    /// An insert was attempted on a record that is already persisted.
    pub fn already_persisted(table: &str) -> Error {
        Error::record_state(RecordStateErrorKind::AlreadyPersisted, table)
    }

    pub fn is_not_writable(&self) -> bool {
        self.is_record_state(RecordStateErrorKind::NotWritable)
    }

    pub fn is_not_persisted(&self) -> bool {
        self.is_record_state(RecordStateErrorKind::NotPersisted)
    }

    pub fn is_already_persisted(&self) -> bool {
        self.is_record_state(RecordStateErrorKind::AlreadyPersisted)
    }

    fn record_state(kind: RecordStateErrorKind, table: &str) -> Error {
        Error::from(super::ErrorKind::RecordState(RecordStateError {
            kind,
            table: table.into(),
        }))
    }

    fn is_record_state(&self, expected: RecordStateErrorKind) -> bool {
        self.any_kind(|kind| {
            matches!(kind, super::ErrorKind::RecordState(err) if err.kind == expected)
        })
    }
}
