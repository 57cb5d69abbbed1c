use super::Error;
use std::time::Duration;

/// Transaction lifecycle errors.
#[derive(Debug)]
pub(super) enum TransactionError {
    TimedOut(Duration),
    InvalidCallback,
}

impl std::error::Error for TransactionError {}

impl core::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            TransactionError::TimedOut(duration) => {
                write!(f, "transaction timed out after {duration:?}")
            }
            TransactionError::InvalidCallback => {
                f.write_str("transaction callback used a store whose transaction already finished")
            }
        }
    }
}

impl Error {
    pub fn transaction_timed_out(duration: Duration) -> Error {
        Error::from(super::ErrorKind::Transaction(TransactionError::TimedOut(
            duration,
        )))
    }

    /// A transaction-bound store was used after its transaction committed or
    /// rolled back.
    pub fn invalid_tx_callback() -> Error {
        Error::from(super::ErrorKind::Transaction(
            TransactionError::InvalidCallback,
        ))
    }

    pub fn is_transaction_timed_out(&self) -> bool {
        self.any_kind(|kind| {
            matches!(
                kind,
                super::ErrorKind::Transaction(TransactionError::TimedOut(_))
            )
        })
    }

    pub fn is_invalid_tx_callback(&self) -> bool {
        self.any_kind(|kind| {
            matches!(
                kind,
                super::ErrorKind::Transaction(TransactionError::InvalidCallback)
            )
        })
    }
}
