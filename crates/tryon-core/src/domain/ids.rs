//! Domain identifiers (strongly-typed IDs).
//!
//! Every persisted or catalogued entity is identified by its creation time in
//! milliseconds since the Unix epoch. The integer is what gets stored and
//! compared for deletion lookups; the phantom marker keeps a look id from
//! being passed where a garment id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// IdMarker provides the display prefix of each id type.
///
/// The comparison supertraits let code generic over the marker compare and
/// order ids (the derives on `Id` bound on them).
pub trait IdMarker:
    fmt::Debug + Copy + Eq + std::hash::Hash + Ord + Send + Sync + 'static
{
    fn prefix() -> &'static str;
}

/// Generic timestamp id.
///
/// Serialized transparently as the bare integer, so the stored shape is
/// `{"id": 1718000000000, ...}`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: i64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub const fn new(value: i64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

impl<T: IdMarker> From<i64> for Id<T> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

// ========================================
// Markers
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Garment {}

impl IdMarker for Garment {
    fn prefix() -> &'static str {
        "garment-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Look {}

impl IdMarker for Look {
    fn prefix() -> &'static str {
        "look-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeasurementSheet {}

impl IdMarker for MeasurementSheet {
    fn prefix() -> &'static str {
        "measurement-"
    }
}

/// Identifier of a catalog garment (built-in or generated at runtime).
pub type GarmentId = Id<Garment>;

/// Identifier of a saved look.
pub type LookId = Id<Look>;

/// Identifier of a saved measurement.
pub type MeasurementId = Id<MeasurementSheet>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_the_type_prefix() {
        assert_eq!(LookId::new(42).to_string(), "look-42");
        assert_eq!(MeasurementId::new(7).to_string(), "measurement-7");
        assert_eq!(GarmentId::new(1).to_string(), "garment-1");
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        let id = LookId::new(1_718_000_000_000);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "1718000000000");

        let back: LookId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn phantom_marker_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<LookId>(), size_of::<i64>());
        assert_eq!(size_of::<GarmentId>(), size_of::<i64>());
    }
}
