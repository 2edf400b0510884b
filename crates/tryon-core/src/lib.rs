//! tryon-core
//!
//! Workflow engine for a virtual try-on studio: photo capture, height,
//! garment selection with a live preview, fit analysis, composition,
//! conversational edits and saved results.
//!
//! # Modules
//! - **domain**: data model (ids, images, garments, outfits, analysis, saved artifacts, errors)
//! - **ports**: traits for the outside world (GenerationGateway, KeyValueStore, Clock, IdGenerator)
//! - **impls**: adapters (Gemini HTTP gateway, scripted gateway, in-memory and file stores)
//! - **app**: the engine (StudioBuilder, Workflow, PreviewScheduler, EditHistory, ArtifactStore)
//! - **config**: `StudioConfig` loading

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use self::app::{StudioBuilder, Workflow};
pub use self::config::StudioConfig;
pub use self::domain::TryOnError;
