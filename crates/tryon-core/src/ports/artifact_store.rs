//! KeyValueStore port - durable storage for saved collections.
//!
//! Each collection is written as one JSON document under its own key. The
//! store knows nothing about what the documents contain; typed access lives in
//! `app::store`.
//!
//! # Implementations
//! - `InMemoryKeyValueStore`: tests and throwaway sessions
//! - `FileKeyValueStore`: one file per key under a data directory

use async_trait::async_trait;

use crate::domain::TryOnError;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when nothing was ever written under `key`.
    async fn read(&self, key: &str) -> Result<Option<String>, TryOnError>;

    /// Replace the whole document under `key`.
    async fn write(&self, key: &str, value: &str) -> Result<(), TryOnError>;
}
