//! Bit-packed relative cell indices.
//!
//! A packed index stores an offset from a schematic's minimal corner in one
//! `u32`: `(dy << 20) | (dz << 10) | dx`, ten bits per axis.

use serde::{Deserialize, Serialize};
use strata_voxel::Offset;

/// Bits per axis in a packed index.
pub const AXIS_BITS: u32 = 10;

/// Exclusive upper bound of an offset along one axis.
pub const AXIS_LIMIT: u32 = 1 << AXIS_BITS;

const AXIS_MASK: u32 = AXIS_LIMIT - 1;
const Z_SHIFT: u32 = AXIS_BITS;
const Y_SHIFT: u32 = AXIS_BITS * 2;

/// A cell's `(dx, dy, dz)` offset from a schematic's minimal corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackedIndex(pub u32);

impl PackedIndex {
    /// Packs an offset. Returns `None` if any component is `>= AXIS_LIMIT`.
    pub fn encode(dx: u32, dy: u32, dz: u32) -> Option<Self> {
        if dx >= AXIS_LIMIT || dy >= AXIS_LIMIT || dz >= AXIS_LIMIT {
            return None;
        }
        Some(Self((dy << Y_SHIFT) | (dz << Z_SHIFT) | dx))
    }

    /// Packs a signed offset; negative components are rejected like oversize ones.
    pub fn from_offset(offset: Offset) -> Option<Self> {
        let dx = u32::try_from(offset.dx).ok()?;
        let dy = u32::try_from(offset.dy).ok()?;
        let dz = u32::try_from(offset.dz).ok()?;
        Self::encode(dx, dy, dz)
    }

    /// Unpacks into `(dx, dy, dz)`.
    pub fn decode(self) -> (u32, u32, u32) {
        let dx = self.0 & AXIS_MASK;
        let dz = (self.0 >> Z_SHIFT) & AXIS_MASK;
        let dy = (self.0 >> Y_SHIFT) & AXIS_MASK;
        (dx, dy, dz)
    }

    pub fn to_offset(self) -> Offset {
        let (dx, dy, dz) = self.decode();
        Offset::new(dx as i32, dy as i32, dz as i32)
    }

    /// Returns `true` if the index uses bits above the three axis fields.
    pub fn has_stray_bits(self) -> bool {
        self.0 >> (AXIS_BITS * 3) != 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_formula() {
        let idx = PackedIndex::encode(3, 5, 7).unwrap();
        assert_eq!(idx.0, (5 << 20) | (7 << 10) | 3);
    }

    #[test]
    fn test_decode_inverts_encode_on_axis_extremes() {
        for &(dx, dy, dz) in &[
            (0, 0, 0),
            (1023, 0, 0),
            (0, 1023, 0),
            (0, 0, 1023),
            (1023, 1023, 1023),
            (512, 1, 1022),
        ] {
            let idx = PackedIndex::encode(dx, dy, dz).unwrap();
            assert_eq!(idx.decode(), (dx, dy, dz));
            assert!(!idx.has_stray_bits());
        }
    }

    #[test]
    fn test_encode_is_injective_along_each_axis() {
        let mut seen = std::collections::HashSet::new();
        for v in 0..AXIS_LIMIT {
            assert!(seen.insert(PackedIndex::encode(v, 0, 0).unwrap()));
            assert!(seen.insert(PackedIndex::encode(0, v, 1).unwrap()));
            assert!(seen.insert(PackedIndex::encode(1, 1, v).unwrap()));
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(PackedIndex::encode(1024, 0, 0).is_none());
        assert!(PackedIndex::encode(0, 1024, 0).is_none());
        assert!(PackedIndex::encode(0, 0, 1024).is_none());
        assert!(PackedIndex::from_offset(Offset::new(-1, 0, 0)).is_none());
    }

    #[test]
    fn test_offset_roundtrip() {
        let offset = Offset::new(12, 400, 9);
        let idx = PackedIndex::from_offset(offset).unwrap();
        assert_eq!(idx.to_offset(), offset);
    }
}
