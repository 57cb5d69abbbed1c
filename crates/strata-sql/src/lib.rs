pub mod migration;
pub use migration::{Change, ChangeSet, LockFile, Migration};

pub mod serializer;
pub use serializer::{Params, Placeholder, Serializer};
