//! Saved artifacts: looks and measurements the user chose to keep.
//!
//! # Trait Bounds
//! - `Serialize` / `DeserializeOwned`: stored as JSON in a named collection
//! - `Clone + Send + Sync + 'static`: held in shared in-memory collections

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::analysis::FitAnalysis;
use super::ids::{Id, IdMarker, Look, LookId, MeasurementId, MeasurementSheet};
use super::image::{EncodedImage, UserPhoto};
use super::outfit::OutfitSelection;

/// A persisted entity kind.
///
/// `COLLECTION` is the key the whole ordered sequence is stored under.
pub trait SavedArtifact: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Marker: IdMarker;

    const COLLECTION: &'static str;

    fn id(&self) -> Id<Self::Marker>;
}

/// A finished composite and what it was made from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLook {
    pub id: LookId,
    pub final_image: EncodedImage,
    pub original_image: UserPhoto,
    pub selected_outfit: OutfitSelection,
}

impl SavedArtifact for SavedLook {
    type Marker = Look;

    const COLLECTION: &'static str = "looks";

    fn id(&self) -> LookId {
        self.id
    }
}

/// A fit analysis and what it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMeasurement {
    pub id: MeasurementId,
    pub fit_analysis: FitAnalysis,
    pub user_image: UserPhoto,
    pub selected_outfit: OutfitSelection,
}

impl SavedArtifact for SavedMeasurement {
    type Marker = MeasurementSheet;

    const COLLECTION: &'static str = "measurements";

    fn id(&self) -> MeasurementId {
        self.id
    }
}
