//! Fit analysis report produced by the generation service.

use serde::{Deserialize, Serialize};

use super::garment::GarmentCategory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub value: String,
}

impl Measurement {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Bare numbers are inches; anything else is shown as given.
    pub fn display_value(&self) -> String {
        let value = self.value.trim();
        let is_number = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.' || c == '-');
        if is_number {
            format!("{value} inches")
        } else {
            value.to_string()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonMeasurements {
    pub measurements: Vec<Measurement>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentFit {
    pub item_name: String,
    pub item_type: GarmentCategory,
    pub fit_description: String,
    #[serde(default)]
    pub garment_measurements: Vec<Measurement>,
}

/// Person measurements plus one fit entry per selected garment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitAnalysis {
    pub person_measurements: PersonMeasurements,
    #[serde(default)]
    pub clothing_fit: Vec<GarmentFit>,
}
