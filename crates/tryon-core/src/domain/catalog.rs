//! Garment catalog.

use std::path::Path;

use super::errors::TryOnError;
use super::garment::{GarmentCategory, GarmentItem};
use super::ids::GarmentId;

/// Ordered garment catalog.
///
/// Built-in entries keep their order; garments generated at runtime are
/// prepended so the newest creation is listed first.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<GarmentItem>,
}

impl Catalog {
    pub fn new(items: Vec<GarmentItem>) -> Self {
        Self { items }
    }

    /// Read a catalog from a JSON array of garment items.
    pub fn load(path: &Path) -> Result<Self, TryOnError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TryOnError::Config(format!("failed to read catalog {path:?}: {e}")))?;
        let items: Vec<GarmentItem> = serde_json::from_str(&text)
            .map_err(|e| TryOnError::Config(format!("failed to parse catalog {path:?}: {e}")))?;
        Ok(Self::new(items))
    }

    /// A small starter catalog, two pieces per category.
    pub fn builtin() -> Self {
        let entry = |id: i64, name: &str, category: GarmentCategory, file: &str, description: &str| {
            GarmentItem::new(
                GarmentId::new(id),
                name,
                category,
                format!("catalog/{file}"),
                description,
            )
        };

        Self::new(vec![
            entry(1, "White Tee", GarmentCategory::Top, "white-tee.png", "A plain white crew-neck cotton t-shirt"),
            entry(2, "Denim Jacket", GarmentCategory::Top, "denim-jacket.png", "A light-wash denim trucker jacket"),
            entry(3, "Black Jeans", GarmentCategory::Pants, "black-jeans.png", "Slim black stretch denim jeans"),
            entry(4, "Cargo Pants", GarmentCategory::Pants, "cargo-pants.png", "Olive relaxed-fit cargo trousers"),
            entry(5, "White Sneakers", GarmentCategory::Shoes, "white-sneakers.png", "Minimal white leather low-top sneakers"),
            entry(6, "Chelsea Boots", GarmentCategory::Shoes, "chelsea-boots.png", "Brown suede chelsea boots"),
            entry(7, "Bucket Hat", GarmentCategory::Accessory, "bucket-hat.png", "A black cotton bucket hat"),
            entry(8, "Aviators", GarmentCategory::Accessory, "aviators.png", "Gold-frame aviator sunglasses"),
        ])
    }

    pub fn get(&self, id: GarmentId) -> Option<&GarmentItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn prepend(&mut self, item: GarmentItem) {
        self.items.insert(0, item);
    }

    pub fn items(&self) -> &[GarmentItem] {
        &self.items
    }

    pub fn by_category(&self, category: GarmentCategory) -> impl Iterator<Item = &GarmentItem> {
        self.items.iter().filter(move |item| item.category == category)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_category() {
        let catalog = Catalog::builtin();
        for category in GarmentCategory::ALL {
            assert_eq!(catalog.by_category(category).count(), 2);
        }
    }

    #[test]
    fn prepended_items_come_first() {
        let mut catalog = Catalog::builtin();
        let created = GarmentItem::new(
            GarmentId::new(1_700_000_000_000),
            "Silver bomber",
            GarmentCategory::Top,
            "data:image/jpeg;base64,QUJD",
            "Silver bomber",
        );
        catalog.prepend(created.clone());

        assert_eq!(catalog.items()[0], created);
        assert_eq!(catalog.by_category(GarmentCategory::Top).next(), Some(&created));
        assert_eq!(catalog.get(created.id), Some(&created));
    }

    #[test]
    fn load_reads_a_json_array() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id": 10, "name": "Scarf", "type": "Accessory", "imageUrl": "scarf.png", "description": "Wool scarf"}]"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(GarmentId::new(10)).unwrap().category, GarmentCategory::Accessory);
    }
}
