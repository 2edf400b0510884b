//! InMemoryKeyValueStore - a `KeyValueStore` that lives as long as the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::TryOnError;
use crate::ports::KeyValueStore;

/// Documents keyed by collection name, behind a mutex.
///
/// Cloning shares the underlying map, so a test can keep a handle and inspect
/// what the engine wrote.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    docs: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, bypassing the port.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        docs.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        docs.get(key).cloned()
    }

    /// Make every subsequent write fail, simulating a full or read-only disk.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>, TryOnError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), TryOnError> {
        if *self.fail_writes.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(TryOnError::Storage(format!("write to '{key}' rejected")));
        }
        self.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_key_reads_as_none() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.read("looks").await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_replaces_the_document() {
        let store = InMemoryKeyValueStore::new();
        store.write("looks", "[1]").await.unwrap();
        store.write("looks", "[2,1]").await.unwrap();
        assert_eq!(store.read("looks").await.unwrap().as_deref(), Some("[2,1]"));
    }

    #[tokio::test]
    async fn failing_writes_leave_the_document_alone() {
        let store = InMemoryKeyValueStore::new();
        store.write("looks", "[1]").await.unwrap();
        store.set_fail_writes(true);

        let err = store.write("looks", "[]").await.unwrap_err();
        assert!(matches!(err, TryOnError::Storage(_)));
        assert_eq!(store.get("looks").as_deref(), Some("[1]"));
    }
}
