//! The relocatable, serializable form of a captured region.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_voxel::{AttachmentId, FreeObject, Layer, MaterialCode, MaterialId, Offset};

use crate::error::FormatError;
use crate::index::{AXIS_LIMIT, PackedIndex};

/// One occupied layer slot.
///
/// A cell holding both a base and a fluid material appears twice with the
/// same index, base first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedCell {
    pub index: PackedIndex,
    /// Layer the material was captured from; placement writes it back there.
    pub layer: Layer,
    /// Material ID in the capturing world; resolve through the palette.
    pub material: MaterialId,
}

/// One decorative attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedDecor {
    pub index: PackedIndex,
    pub slot: AttachmentId,
    pub material: MaterialId,
}

/// A captured region, relative to its own minimal corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackedSchematic {
    /// Cells along x, y, z. Each is in `1..1024`.
    pub size: (u32, u32, u32),
    /// Capturing-world ID → portable code, for every material used.
    pub palette: BTreeMap<MaterialId, MaterialCode>,
    pub cells: Vec<PackedCell>,
    pub decor: Vec<PackedDecor>,
    pub aux_payloads: BTreeMap<PackedIndex, Vec<u8>>,
    /// Encoded [`FreeObject`]s whose positions are offsets from the minimal corner.
    pub free_objects: Vec<Vec<u8>>,
    /// Minimal corner minus the origin the caller asked to pack at.
    pub packed_offset: Offset,
}

impl PackedSchematic {
    /// Checks the structural invariants a placer relies on.
    ///
    /// # Errors
    ///
    /// [`FormatError::Invalid`] naming the first violated invariant.
    pub fn validate(&self) -> Result<(), FormatError> {
        let (sx, sy, sz) = self.size;
        for (axis, extent) in [("x", sx), ("y", sy), ("z", sz)] {
            if extent == 0 || extent >= AXIS_LIMIT {
                return Err(FormatError::Invalid(format!(
                    "size along {axis} is {extent}, expected 1..{AXIS_LIMIT}"
                )));
            }
        }

        let inside = |index: PackedIndex| {
            let (dx, dy, dz) = index.decode();
            !index.has_stray_bits() && dx < sx && dy < sy && dz < sz
        };

        for cell in &self.cells {
            if !inside(cell.index) {
                return Err(FormatError::Invalid(format!(
                    "cell index {:#x} lies outside {:?}",
                    cell.index.0, self.size
                )));
            }
            if !self.palette.contains_key(&cell.material) {
                return Err(FormatError::Invalid(format!(
                    "cell material {:?} missing from palette",
                    cell.material
                )));
            }
        }
        for decor in &self.decor {
            if !inside(decor.index) {
                return Err(FormatError::Invalid(format!(
                    "decor index {:#x} lies outside {:?}",
                    decor.index.0, self.size
                )));
            }
            if !self.palette.contains_key(&decor.material) {
                return Err(FormatError::Invalid(format!(
                    "decor material {:?} missing from palette",
                    decor.material
                )));
            }
        }
        if let Some(index) = self.aux_payloads.keys().find(|i| !inside(**i)) {
            return Err(FormatError::Invalid(format!(
                "payload index {:#x} lies outside {:?}",
                index.0, self.size
            )));
        }
        Ok(())
    }
}

/// Encodes a free object whose position is already relative.
pub(crate) fn encode_free_object(object: &FreeObject) -> Result<Vec<u8>, postcard::Error> {
    postcard::to_allocvec(object)
}

/// Decodes a blob produced by [`encode_free_object`].
pub fn decode_free_object(blob: &[u8]) -> Result<FreeObject, postcard::Error> {
    postcard::from_bytes(blob)
}
