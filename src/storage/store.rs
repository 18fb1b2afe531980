//! Entity store interface and the in-memory backend

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use thiserror::Error;
use tokio::sync::RwLock;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Anything kept in a [`Store`]
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Collection name (used for file names and error messages)
    const KIND: &'static str;

    fn id(&self) -> &str;
}

/// get/list/put/remove over one entity type
#[async_trait]
pub trait Store<T: Entity>: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<T>, StorageError>;

    async fn list(&self) -> Result<Vec<T>, StorageError>;

    /// Insert or replace by id
    async fn put(&self, item: T) -> Result<(), StorageError>;

    async fn remove(&self, id: &str) -> Result<Option<T>, StorageError>;
}

/// Volatile store
#[derive(Debug)]
pub struct MemoryStore<T> {
    items: RwLock<HashMap<String, T>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T: Entity> Store<T> for MemoryStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, StorageError> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>, StorageError> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn put(&self, item: T) -> Result<(), StorageError> {
        self.items
            .write()
            .await
            .insert(item.id().to_string(), item);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<Option<T>, StorageError> {
        Ok(self.items.write().await.remove(id))
    }
}
