//! In-memory storage implementation.

use super::{Storage, StorageResult};
use std::collections::BTreeMap;

/// In-memory storage for testing and ephemeral use.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.values.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.values.keys().cloned().collect())
    }
}

/// Memory storage whose next writes fail, for exercising error paths.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingStorage {
    pub inner: MemoryStorage,
    /// Number of upcoming `set` calls that fail.
    pub failing_writes: usize,
}

#[cfg(test)]
impl Storage for FailingStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(super::StorageError::Io(format!("write to {} refused", key)));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.inner.keys()
    }
}
