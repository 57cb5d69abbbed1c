mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::{async_trait, schema::db::ModelSchema};

use std::{borrow::Cow, fmt::Debug};

/// A database backend. Produces connections for the pool.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// The connection URL, for logs.
    fn url(&self) -> Cow<'_, str>;

    /// Opens a new connection.
    async fn connect(&self) -> crate::Result<Box<dyn Connection>>;

    /// Upper bound on concurrent connections, if the backend imposes one.
    fn max_connections(&self) -> Option<usize> {
        None
    }
}

/// A single database session.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Executes a database operation.
    async fn exec(&mut self, op: Operation) -> crate::Result<Response>;

    /// Creates the tables described by `schema`.
    async fn push_schema(&mut self, schema: &ModelSchema) -> crate::Result<()>;
}
