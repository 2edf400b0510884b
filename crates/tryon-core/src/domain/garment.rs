//! Garments and their categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::TryOnError;
use super::ids::GarmentId;

/// Garment category. The set is closed; every outfit has one slot per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GarmentCategory {
    Top,
    Pants,
    Shoes,
    Accessory,
}

impl GarmentCategory {
    pub const ALL: [GarmentCategory; 4] = [
        GarmentCategory::Top,
        GarmentCategory::Pants,
        GarmentCategory::Shoes,
        GarmentCategory::Accessory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GarmentCategory::Top => "Top",
            GarmentCategory::Pants => "Pants",
            GarmentCategory::Shoes => "Shoes",
            GarmentCategory::Accessory => "Accessory",
        }
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GarmentCategory {
    type Err = TryOnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GarmentCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TryOnError::invalid_input(format!("unknown garment category '{s}'")))
    }
}

/// A catalog entry. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentItem {
    pub id: GarmentId,
    pub name: String,
    #[serde(rename = "type")]
    pub category: GarmentCategory,
    pub image_url: String,
    pub description: String,
}

impl GarmentItem {
    pub fn new(
        id: GarmentId,
        name: impl Into<String>,
        category: GarmentCategory,
        image_url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            image_url: image_url.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::exact("Top", GarmentCategory::Top)]
    #[case::lower("pants", GarmentCategory::Pants)]
    #[case::padded(" shoes ", GarmentCategory::Shoes)]
    #[case::upper("ACCESSORY", GarmentCategory::Accessory)]
    fn category_parses_case_insensitively(#[case] input: &str, #[case] expected: GarmentCategory) {
        assert_eq!(input.parse::<GarmentCategory>().unwrap(), expected);
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!("hat".parse::<GarmentCategory>().is_err());
    }

    #[test]
    fn item_serializes_category_as_type() {
        let item = GarmentItem::new(
            GarmentId::new(3),
            "Denim Jacket",
            GarmentCategory::Top,
            "https://example.invalid/jacket.png",
            "A washed denim jacket",
        );
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["id"], 3);
        assert_eq!(v["type"], "Top");
        assert_eq!(v["imageUrl"], "https://example.invalid/jacket.png");
    }
}
