//! StudioBuilder - wiring and session bootstrap.
//!
//! Collects the gateway, storage backend, catalog and settings, checks them
//! once, hydrates both saved collections from the store and hands back a
//! `Workflow` in `Capture`.
//!
//! # Fail-fast
//! - a zero settle delay would send a preview request per click
//! - an export file name must be a bare file name
//! - an empty catalog leaves nothing to select

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::app::store::{ArtifactStore, SavedLooks, SavedMeasurements};
use crate::app::workflow::Workflow;
use crate::config::StudioConfig;
use crate::domain::{Catalog, TryOnError};
use crate::impls::{FileKeyValueStore, InMemoryKeyValueStore};
use crate::ports::{GenerationGateway, IdGenerator, KeyValueStore, SystemClock, TimestampIdGenerator};

/// ```ignore
/// let workflow = StudioBuilder::new(gateway)
///     .store(Arc::new(FileKeyValueStore::new(data_dir)))
///     .settle_delay(Duration::from_millis(800))
///     .build()
///     .await?;
/// ```
pub struct StudioBuilder {
    gateway: Arc<dyn GenerationGateway>,
    store: Option<Arc<dyn KeyValueStore>>,
    ids: Option<Arc<dyn IdGenerator>>,
    catalog: Catalog,
    settle_delay: Duration,
    export_file_name: String,
}

impl StudioBuilder {
    /// Defaults: in-memory store, built-in catalog, wall-clock ids and the
    /// default config's delay and file name.
    pub fn new(gateway: Arc<dyn GenerationGateway>) -> Self {
        let defaults = StudioConfig::default();
        Self {
            gateway,
            store: None,
            ids: None,
            catalog: Catalog::builtin(),
            settle_delay: defaults.settle_delay(),
            export_file_name: defaults.export_file_name,
        }
    }

    /// File-backed store under `config.data_dir`, plus the config's delay and file name.
    pub fn from_config(gateway: Arc<dyn GenerationGateway>, config: &StudioConfig) -> Self {
        Self::new(gateway)
            .store(Arc::new(FileKeyValueStore::new(&config.data_dir)))
            .settle_delay(config.settle_delay())
            .export_file_name(config.export_file_name.clone())
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = name.into();
        self
    }

    fn validate(&self) -> Result<(), TryOnError> {
        if self.settle_delay.is_zero() {
            return Err(TryOnError::Config("settle delay must be greater than zero".into()));
        }
        let name = self.export_file_name.trim();
        let bare = Path::new(name).file_name().is_some_and(|f| f == name);
        if name.is_empty() || !bare {
            return Err(TryOnError::Config(format!(
                "export file name '{}' must be a plain file name",
                self.export_file_name
            )));
        }
        if self.catalog.is_empty() {
            return Err(TryOnError::Config("catalog is empty".into()));
        }
        Ok(())
    }

    /// Validate, hydrate the saved collections and start a session in `Capture`.
    pub async fn build(self) -> Result<Workflow, TryOnError> {
        self.validate()?;

        let backend = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryKeyValueStore::new()));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(TimestampIdGenerator::new(SystemClock)));
        let store = ArtifactStore::new(backend);
        let looks = SavedLooks::hydrate(store.clone()).await;
        let measurements = SavedMeasurements::hydrate(store).await;

        Ok(Workflow::new(
            self.gateway,
            ids,
            self.catalog,
            looks,
            measurements,
            self.settle_delay,
            self.export_file_name,
        ))
    }
}
