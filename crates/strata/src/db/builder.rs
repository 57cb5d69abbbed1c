use super::{Config, Connect, Pool, PoolConfig};
use crate::{store::Shared, Result, Store};

use std::{sync::Arc, time::Duration};
use strata_core::{driver::Driver, schema::SchemaRegistry, Schema};

/// Configures and opens a [`Store`].
///
/// ```ignore
/// let store = Store::builder()
///     .register(people())
///     .register(cars())
///     .batch_size(100)
///     .connect("postgresql://localhost/app")
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    schemas: Vec<Schema>,
    config: Config,
    pool: PoolConfig,
}

impl Builder {
    pub fn register(&mut self, schema: Schema) -> &mut Self {
        self.schemas.push(schema);
        self
    }

    /// Replaces every setting with those of `config`.
    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    pub fn batch_size(&mut self, batch_size: u64) -> &mut Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn pool_max_size(&mut self, max_size: usize) -> &mut Self {
        self.config.pool_max_size = Some(max_size);
        self
    }

    pub fn transaction_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.transaction_timeout = timeout;
        self
    }

    /// Opens a store on the driver selected by the URL's scheme.
    pub async fn connect(&mut self, url: &str) -> Result<Store> {
        self.build(Connect::new(url)?).await
    }

    /// Opens a store on the URL of the configuration.
    pub async fn connect_configured(&mut self) -> Result<Store> {
        let Some(url) = self.config.url.clone() else {
            return Err(strata_core::err!("no database URL configured"));
        };
        self.connect(&url).await
    }

    /// Registers the schemas and opens a store on `driver`. One connection is
    /// checked out to verify the database is reachable.
    pub async fn build(&mut self, driver: impl Driver) -> Result<Store> {
        let mut registry = SchemaRegistry::new();
        for schema in &self.schemas {
            registry.register(schema.clone())?;
        }

        let mut pool_config = self.pool.clone();
        if let Some(max_size) = self.config.pool_max_size {
            pool_config.max_size = max_size;
        }

        let url = driver.url().into_owned();
        let pool = Pool::new(driver, pool_config)?;
        drop(pool.get().await?);

        tracing::debug!(
            url = %url,
            tables = registry.len(),
            pool_max_size = pool.max_size(),
            "store opened"
        );

        Ok(Store::from_shared(Arc::new(Shared {
            pool,
            registry,
            config: self.config.clone(),
        })))
    }
}
