//! Domain model (ids, images, garments, outfits, analysis, saved artifacts, errors).
//!
//! Pure data and validation. Nothing here talks to the generation service or
//! to storage.

pub mod analysis;
pub mod catalog;
pub mod errors;
pub mod garment;
pub mod height;
pub mod ids;
pub mod image;
pub mod outfit;
pub mod preset;
pub mod saved;
pub mod step;

pub use self::analysis::{FitAnalysis, GarmentFit, Measurement, PersonMeasurements};
pub use self::catalog::Catalog;
pub use self::errors::{ErrorKind, GatewayError, TryOnError};
pub use self::garment::{GarmentCategory, GarmentItem};
pub use self::height::Height;
pub use self::ids::{GarmentId, Id, IdMarker, LookId, MeasurementId};
pub use self::image::{EncodedImage, UserPhoto};
pub use self::outfit::OutfitSelection;
pub use self::preset::{CustomizationPreset, presets_for};
pub use self::saved::{SavedArtifact, SavedLook, SavedMeasurement};
pub use self::step::{Operation, StepKind};
