//! The unpacked, absolute-coordinate form of a captured region.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use strata_voxel::{DecorSet, FreeObject, MaterialId, Position};

/// Captured cells keyed by absolute [`Position`].
///
/// Every key of `aux` or `decor` is also a key of `base`; the scanner records
/// a base material (possibly air) for every visited cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVoxelMap {
    pub base: FxHashMap<Position, MaterialId>,
    pub fluid: FxHashMap<Position, MaterialId>,
    pub aux: FxHashMap<Position, Vec<u8>>,
    pub decor: FxHashMap<Position, DecorSet>,
    /// Materials referenced only from inside auxiliary payloads.
    pub payload_materials: BTreeSet<MaterialId>,
    /// Objects with absolute locations.
    pub free_objects: Vec<FreeObject>,
}

impl SparseVoxelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cells with a recorded base material.
    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Every position carrying any layer, deduplicated, in `(y, z, x)` order.
    pub fn positions(&self) -> Vec<Position> {
        let mut keys: Vec<Position> = self
            .base
            .keys()
            .chain(self.fluid.keys())
            .chain(self.aux.keys())
            .chain(self.decor.keys())
            .copied()
            .collect();
        keys.sort_by_key(|p| (p.dimension, p.y, p.z, p.x));
        keys.dedup();
        keys
    }
}
