mod builder;
pub use builder::Builder;

mod config;
pub use config::Config;

mod connect;
pub use connect::Connect;

mod pool;
pub use pool::{Pool, PoolConfig, PoolConnection, Timeouts};
