//! Typed access to saved collections.
//!
//! `ArtifactStore` maps a `SavedArtifact` type to its collection key and
//! (de)serializes the whole ordered sequence, newest first. `SavedCollection`
//! is the hydrated in-memory mirror the workflow mutates.
//!
//! Availability wins over durability: unreadable data loads as an empty
//! collection, and a failed write is logged without touching memory.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{Id, SavedArtifact, SavedLook, SavedMeasurement, TryOnError};
use crate::ports::KeyValueStore;

#[derive(Clone)]
pub struct ArtifactStore {
    backend: Arc<dyn KeyValueStore>,
}

impl ArtifactStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// The stored sequence, or empty when absent or unreadable.
    pub async fn load<T: SavedArtifact>(&self) -> Vec<T> {
        let raw = match self.backend.read(T::COLLECTION).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(collection = T::COLLECTION, error = %e, "failed to read collection, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => {
                debug!(collection = T::COLLECTION, count = items.len(), "collection loaded");
                items
            }
            Err(e) => {
                warn!(collection = T::COLLECTION, error = %e, "corrupt collection, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the stored sequence.
    pub async fn write_all<T: SavedArtifact>(&self, items: &[T]) -> Result<(), TryOnError> {
        let json = serde_json::to_string(items)
            .map_err(|e| TryOnError::Storage(format!("failed to encode {}: {e}", T::COLLECTION)))?;
        self.backend.write(T::COLLECTION, &json).await
    }

    /// Prepend `entity` to the stored sequence, replacing any entry with the same id.
    pub async fn save<T: SavedArtifact>(&self, entity: T) -> Result<Vec<T>, TryOnError> {
        let mut items = self.load::<T>().await;
        items.retain(|existing| existing.id() != entity.id());
        items.insert(0, entity);
        self.write_all(&items).await?;
        Ok(items)
    }

    /// Remove by id. Nothing is written when no entry matched, so an absent
    /// or unreadable document is left as it was.
    pub async fn delete<T: SavedArtifact>(&self, id: Id<T::Marker>) -> Result<Vec<T>, TryOnError> {
        let mut items = self.load::<T>().await;
        let before = items.len();
        items.retain(|existing| existing.id() != id);
        if items.len() == before {
            debug!(collection = T::COLLECTION, %id, "nothing to delete");
            return Ok(items);
        }
        self.write_all(&items).await?;
        Ok(items)
    }
}

/// In-memory mirror of one collection.
pub struct SavedCollection<T: SavedArtifact> {
    store: ArtifactStore,
    items: Vec<T>,
}

pub type SavedLooks = SavedCollection<SavedLook>;
pub type SavedMeasurements = SavedCollection<SavedMeasurement>;

impl<T: SavedArtifact> SavedCollection<T> {
    pub async fn hydrate(store: ArtifactStore) -> Self {
        let items = store.load::<T>().await;
        info!(collection = T::COLLECTION, count = items.len(), "hydrated");
        Self { store, items }
    }

    /// Newest first.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: Id<T::Marker>) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: Id<T::Marker>) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Prepend and persist the full sequence. Returns the entity's id.
    pub async fn save(&mut self, entity: T) -> Id<T::Marker> {
        let id = entity.id();
        self.items.retain(|existing| existing.id() != id);
        self.items.insert(0, entity);
        self.persist().await;
        id
    }

    /// Remove by id and persist. Returns whether anything was removed.
    pub async fn delete(&mut self, id: Id<T::Marker>) -> bool {
        let before = self.items.len();
        self.items.retain(|existing| existing.id() != id);
        let removed = self.items.len() != before;
        if removed {
            self.persist().await;
        }
        removed
    }

    async fn persist(&self) {
        if let Err(e) = self.store.write_all(&self.items).await {
            warn!(collection = T::COLLECTION, error = %e, "failed to persist collection");
        }
    }
}
