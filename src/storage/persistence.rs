//! JSON file persistence
//!
//! Each collection lives in `<data_dir>/<kind>.json`. The whole collection is
//! kept in memory and rewritten on every mutation through a temporary file
//! and an atomic rename, rotating a bounded number of backups.

use crate::storage::store::{Entity, Store, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".multisig_data"),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

fn collection_path<T: Entity>(config: &StorageConfig) -> PathBuf {
    config.data_dir.join(format!("{}.json", T::KIND))
}

/// Durable [`Store`] backed by one JSON file per collection
#[derive(Debug)]
pub struct JsonFileStore<T> {
    config: StorageConfig,
    items: RwLock<HashMap<String, T>>,
}

impl<T: Entity> JsonFileStore<T> {
    /// Open (or create) the collection file under `config.data_dir`
    pub fn open(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;

        let path = collection_path::<T>(&config);
        let mut items = HashMap::new();
        if path.exists() {
            let file = fs::File::open(&path)?;
            let reader = BufReader::new(file);
            let loaded: Vec<T> = serde_json::from_reader(reader)?;
            log::debug!("Loaded {} {} from {}", loaded.len(), T::KIND, path.display());
            items.extend(loaded.into_iter().map(|item| (item.id().to_string(), item)));
        }

        Ok(Self {
            config,
            items: RwLock::new(items),
        })
    }

    fn collection_path(&self) -> PathBuf {
        collection_path::<T>(&self.config)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.json.backup.{}", T::KIND, index))
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        if self.config.max_backups == 0 {
            return Ok(());
        }

        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    fn save(&self, items: &HashMap<String, T>) -> Result<(), StorageError> {
        let path = self.collection_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        let mut sorted: Vec<&T> = items.values().collect();
        sorted.sort_by(|a, b| a.id().cmp(b.id()));

        // Write to temporary file first
        let temp_path = self.config.data_dir.join(format!("{}.tmp", T::KIND));
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &sorted)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Store<T> for JsonFileStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, StorageError> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>, StorageError> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn put(&self, item: T) -> Result<(), StorageError> {
        let mut items = self.items.write().await;
        let previous = items.insert(item.id().to_string(), item.clone());
        if let Err(e) = self.save(&items) {
            // Keep memory consistent with disk
            match previous {
                Some(previous) => items.insert(item.id().to_string(), previous),
                None => items.remove(item.id()),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<Option<T>, StorageError> {
        let mut items = self.items.write().await;
        let removed = items.remove(id);
        if let Some(item) = &removed {
            if let Err(e) = self.save(&items) {
                items.insert(id.to_string(), item.clone());
                return Err(e);
            }
        }
        Ok(removed)
    }
}
