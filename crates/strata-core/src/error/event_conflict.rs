use super::Error;

/// A record declares hooks whose relative order would be ambiguous.
#[derive(Debug)]
pub(super) struct EventConflictError {
    table: Box<str>,
    first: &'static str,
    second: &'static str,
}

impl std::error::Error for EventConflictError {}

impl core::fmt::Display for EventConflictError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "event conflict on `{}`: `{}` cannot be declared together with `{}`",
            self.table, self.first, self.second
        )
    }
}

impl Error {
    pub fn event_conflict(table: &str, first: &'static str, second: &'static str) -> Error {
        Error::from(super::ErrorKind::EventConflict(EventConflictError {
            table: table.into(),
            first,
            second,
        }))
    }

    pub fn is_event_conflict(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::EventConflict(_)))
    }
}
