use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("database error: {0}")]
    Backend(String),
    #[error("codec error: {0}")]
    Codec(String),
}

/// Generic key-value persistence over sled. Values are bincode-encoded;
/// keys are plain strings so the database stays inspectable.
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let db = sled::open(Path::new(path)).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(Storage { db })
    }

    // Generic Helper: Put
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let serialized = bincode::serialize(value).map_err(|e| StorageError::Codec(e.to_string()))?;
        self.db
            .insert(key.as_bytes(), serialized)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    // Generic Helper: Get
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(data)) => {
                let deserialized =
                    bincode::deserialize(&data).map_err(|e| StorageError::Codec(e.to_string()))?;
                Ok(Some(deserialized))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    pub fn contains(&self, key: &str) -> Result<bool, StorageError> {
        self.db
            .contains_key(key.as_bytes())
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }
}
