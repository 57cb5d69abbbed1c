use super::Error;

/// Error when a result set or statement is used in a way its state does not
/// allow, or when a driver returns an unexpected response shape.
#[derive(Debug)]
pub(super) struct InvalidResultError {
    kind: InvalidResultErrorKind,
    message: Box<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InvalidResultErrorKind {
    InvalidResult,
    AlreadyClosed,
    EmptyRawQuery,
}

impl std::error::Error for InvalidResultError {}

impl core::fmt::Display for InvalidResultError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.kind {
            InvalidResultErrorKind::InvalidResult => write!(f, "invalid result: {}", self.message),
            InvalidResultErrorKind::AlreadyClosed => {
                write!(f, "{} is already closed", self.message)
            }
            InvalidResultErrorKind::EmptyRawQuery => {
                write!(f, "refusing to run raw query without predicate: {}", self.message)
            }
        }
    }
}

impl Error {
    /// Creates an error for an unexpected driver response or cursor state.
    pub fn invalid_result(message: impl Into<String>) -> Error {
        Error::invalid_result_kind(InvalidResultErrorKind::InvalidResult, message.into())
    }

    /// A result set or batching runner was closed twice.
    pub fn already_closed(what: &str) -> Error {
        Error::invalid_result_kind(InvalidResultErrorKind::AlreadyClosed, what.into())
    }

    /// A raw update or delete was attempted without a predicate.
    pub fn empty_raw_query(table: &str) -> Error {
        Error::invalid_result_kind(InvalidResultErrorKind::EmptyRawQuery, table.into())
    }

    pub fn is_invalid_result(&self) -> bool {
        self.is_invalid_result_kind(InvalidResultErrorKind::InvalidResult)
    }

    pub fn is_already_closed(&self) -> bool {
        self.is_invalid_result_kind(InvalidResultErrorKind::AlreadyClosed)
    }

    pub fn is_empty_raw_query(&self) -> bool {
        self.is_invalid_result_kind(InvalidResultErrorKind::EmptyRawQuery)
    }

    fn invalid_result_kind(kind: InvalidResultErrorKind, message: String) -> Error {
        Error::from(super::ErrorKind::InvalidResult(InvalidResultError {
            kind,
            message: message.into_boxed_str(),
        }))
    }

    fn is_invalid_result_kind(&self, expected: InvalidResultErrorKind) -> bool {
        self.any_kind(|kind| {
            matches!(kind, super::ErrorKind::InvalidResult(err) if err.kind == expected)
        })
    }
}
