//! Storage for accounts, transactions and proposals

pub mod locks;
pub mod persistence;
pub mod store;

pub use locks::KeyedLocks;
pub use persistence::{JsonFileStore, StorageConfig};
pub use store::{Entity, MemoryStore, StorageError, Store};
