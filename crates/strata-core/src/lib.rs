pub mod driver;
pub use driver::{Connection, Driver};

mod error;
pub use error::{Error, IntoError};

pub mod record;
pub use record::Record;

pub mod schema;
pub use schema::Schema;

pub mod stmt;

/// A Result type alias that uses Strata's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
