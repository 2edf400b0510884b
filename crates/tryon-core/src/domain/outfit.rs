//! Outfit selection: one slot per garment category.

use serde::{Deserialize, Serialize};

use super::garment::{GarmentCategory, GarmentItem};

/// The garments currently worn, at most one per category.
///
/// Every category key is always present when serialized; an empty slot is
/// `null`. Slots are only changed through `toggle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitSelection {
    #[serde(rename = "Top", default)]
    top: Option<GarmentItem>,
    #[serde(rename = "Pants", default)]
    pants: Option<GarmentItem>,
    #[serde(rename = "Shoes", default)]
    shoes: Option<GarmentItem>,
    #[serde(rename = "Accessory", default)]
    accessory: Option<GarmentItem>,
}

impl OutfitSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, category: GarmentCategory) -> Option<&GarmentItem> {
        match category {
            GarmentCategory::Top => self.top.as_ref(),
            GarmentCategory::Pants => self.pants.as_ref(),
            GarmentCategory::Shoes => self.shoes.as_ref(),
            GarmentCategory::Accessory => self.accessory.as_ref(),
        }
    }

    fn slot_mut(&mut self, category: GarmentCategory) -> &mut Option<GarmentItem> {
        match category {
            GarmentCategory::Top => &mut self.top,
            GarmentCategory::Pants => &mut self.pants,
            GarmentCategory::Shoes => &mut self.shoes,
            GarmentCategory::Accessory => &mut self.accessory,
        }
    }

    /// Toggle an item into its category slot.
    ///
    /// Selecting the item already in the slot clears the slot; selecting a
    /// different item replaces it. Returns whether the item is now selected.
    pub fn toggle(&mut self, item: GarmentItem) -> bool {
        let slot = self.slot_mut(item.category);
        if slot.as_ref().is_some_and(|current| current.id == item.id) {
            *slot = None;
            false
        } else {
            *slot = Some(item);
            true
        }
    }

    pub fn is_selected(&self, item: &GarmentItem) -> bool {
        self.slot(item.category)
            .is_some_and(|current| current.id == item.id)
    }

    /// Selected items in category order.
    pub fn items(&self) -> Vec<GarmentItem> {
        GarmentCategory::ALL
            .into_iter()
            .filter_map(|category| self.slot(category).cloned())
            .collect()
    }

    pub fn count(&self) -> usize {
        GarmentCategory::ALL
            .into_iter()
            .filter(|category| self.slot(*category).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
