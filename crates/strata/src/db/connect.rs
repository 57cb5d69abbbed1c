use crate::Result;

use std::borrow::Cow;
use strata_core::{
    async_trait,
    driver::{Connection, Driver},
};
use url::Url;

/// A driver chosen by the scheme of a connection URL.
///
/// | Scheme | Driver | Feature |
/// |--------|--------|---------|
/// | `memory` | in-process tables | `memory` |
/// | `postgresql`, `postgres` | `tokio-postgres` | `postgresql` |
#[derive(Debug)]
pub struct Connect {
    url: Url,
    driver: Box<dyn Driver>,
}

impl Connect {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(anyhow::Error::from)?;

        let driver = match url.scheme() {
            "memory" => connect_memory(&url)?,
            "postgresql" | "postgres" => connect_postgresql(&url)?,
            scheme => {
                return Err(strata_core::err!(
                    "unsupported database; scheme={scheme}; url={url}"
                ))
            }
        };

        Ok(Self { url, driver })
    }
}

#[async_trait]
impl Driver for Connect {
    fn url(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.url.as_str())
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        self.driver.connect().await
    }

    fn max_connections(&self) -> Option<usize> {
        self.driver.max_connections()
    }
}

#[cfg(feature = "memory")]
fn connect_memory(url: &Url) -> Result<Box<dyn Driver>> {
    Ok(Box::new(strata_driver_memory::Memory::from_url(url.as_str())?))
}

#[cfg(not(feature = "memory"))]
fn connect_memory(_url: &Url) -> Result<Box<dyn Driver>> {
    Err(strata_core::err!("`memory` feature not enabled"))
}

#[cfg(feature = "postgresql")]
fn connect_postgresql(url: &Url) -> Result<Box<dyn Driver>> {
    Ok(Box::new(strata_driver_postgresql::PostgreSQL::new(
        url.as_str(),
    )?))
}

#[cfg(not(feature = "postgresql"))]
fn connect_postgresql(_url: &Url) -> Result<Box<dyn Driver>> {
    Err(strata_core::err!("`postgresql` feature not enabled"))
}
