use crate::{stmt::RowStream, Error, Result};

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Operation result, as a stream of rows
    Values(RowStream),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn row_stream(rows: impl Into<RowStream>) -> Self {
        Self {
            rows: Rows::Values(rows.into()),
        }
    }

    pub fn empty_row_stream() -> Self {
        Self {
            rows: Rows::Values(RowStream::default()),
        }
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Self::Values(_))
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Rows::Count(count) => Ok(count),
            Rows::Values(_) => Err(Error::invalid_result("expected a row count, got rows")),
        }
    }

    pub fn into_values(self) -> Result<RowStream> {
        match self {
            Rows::Values(values) => Ok(values),
            Rows::Count(_) => Err(Error::invalid_result("expected rows, got a row count")),
        }
    }
}
