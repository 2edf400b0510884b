//! Canned customization instructions offered for the selected garments.

use super::garment::GarmentCategory;
use super::outfit::OutfitSelection;

/// A labelled instruction. Applying one is the same as typing its instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizationPreset {
    pub category: GarmentCategory,
    pub label: &'static str,
    pub instruction: String,
}

const TOP_FITS: [&str; 5] = ["Baggy Fit", "Slim Fit", "Oversized", "Boxy Fit", "Cropped"];

const TOP_STYLES: [(&str, &str); 5] = [
    ("Short Sleeve", "Make the top short-sleeved"),
    ("Tank Top", "Make the top into a tank top"),
    ("Add Hood", "Make the top into a hoodie"),
    ("Black", "Change the color of the top to black"),
    ("White", "Change the color of the top to white"),
];

const PANTS_STYLES: [(&str, &str); 6] = [
    ("Baggy Fit", "Make the pants baggy fit"),
    ("Skinny Fit", "Make the pants skinny fit"),
    ("Cropped", "Make the pants cropped length"),
    ("Shorts", "Make the pants into shorts"),
    ("Add Rips", "Add rips to the knees of the pants"),
    ("Make Denim", "Change the material of the pants to blue denim"),
];

/// Presets for whichever of top and pants are selected. Other categories have none.
pub fn presets_for(selection: &OutfitSelection) -> Vec<CustomizationPreset> {
    let mut presets = Vec::new();

    if selection.slot(GarmentCategory::Top).is_some() {
        presets.extend(TOP_FITS.iter().map(|&label| CustomizationPreset {
            category: GarmentCategory::Top,
            label,
            instruction: format!("Make the top {}", label.to_lowercase()),
        }));
        presets.extend(TOP_STYLES.iter().map(|&(label, instruction)| CustomizationPreset {
            category: GarmentCategory::Top,
            label,
            instruction: instruction.to_string(),
        }));
    }

    if selection.slot(GarmentCategory::Pants).is_some() {
        presets.extend(PANTS_STYLES.iter().map(|&(label, instruction)| CustomizationPreset {
            category: GarmentCategory::Pants,
            label,
            instruction: instruction.to_string(),
        }));
    }

    presets
}
