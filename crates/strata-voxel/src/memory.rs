//! In-memory world keyed by [`Position`], implementing [`WorldRead`] and [`WorldWrite`].
//!
//! Writes issued through [`WorldWrite`] are queued and applied in order on
//! [`WorldWrite::commit`], the way a host's bulk accessor behaves. Setup helpers
//! (`put_*`) write through immediately.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::material::{Layer, MaterialId, MaterialRegistry};
use crate::position::{BlockBox, Position};
use crate::world::{
    AttachmentId, AuxState, AuxStateError, DecorSet, FreeObject, MaterialRemap, WorldRead,
    WorldWrite,
};

/// Stored contents of one cell.
#[derive(Clone, Debug, Default, PartialEq)]
struct Cell {
    base: MaterialId,
    fluid: MaterialId,
    decor: DecorSet,
    aux: Option<StoredAux>,
}

impl Cell {
    fn is_empty(&self) -> bool {
        self.base.is_air() && self.fluid.is_air() && self.decor.is_empty() && self.aux.is_none()
    }
}

/// Decoded auxiliary state: the materials it references plus free-form bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct StoredAux {
    materials: Vec<MaterialId>,
    data: Vec<u8>,
}

#[derive(Clone, Debug)]
enum PendingWrite {
    Material(Position, Layer, MaterialId),
    Decor(Position, AttachmentId, MaterialId),
    ClearDecor(Position),
}

/// A sparse world held entirely in memory.
pub struct VoxelWorld {
    registry: MaterialRegistry,
    cells: FxHashMap<Position, Cell>,
    free_objects: Vec<FreeObject>,
    pending: Vec<PendingWrite>,
    modified: FxHashSet<Position>,
    commits: u64,
}

impl VoxelWorld {
    /// Creates an empty (all-air) world over the given registry.
    pub fn new(registry: MaterialRegistry) -> Self {
        Self {
            registry,
            cells: FxHashMap::default(),
            free_objects: Vec::new(),
            pending: Vec::new(),
            modified: FxHashSet::default(),
            commits: 0,
        }
    }

    /// Writes a material immediately, bypassing the write queue.
    pub fn put(&mut self, position: Position, layer: Layer, material: MaterialId) {
        let cell = self.cells.entry(position).or_default();
        match layer {
            Layer::Base => cell.base = material,
            Layer::Fluid => cell.fluid = material,
        }
    }

    /// Attaches a decor immediately.
    pub fn put_decor(&mut self, position: Position, slot: AttachmentId, material: MaterialId) {
        self.cells
            .entry(position)
            .or_default()
            .decor
            .insert(slot, material);
    }

    /// Stores auxiliary state immediately. `materials` are the IDs the state refers to.
    pub fn put_aux(&mut self, position: Position, materials: Vec<MaterialId>, data: Vec<u8>) {
        self.cells.entry(position).or_default().aux = Some(StoredAux { materials, data });
    }

    /// Adds a free object immediately.
    pub fn put_free_object(&mut self, object: FreeObject) {
        self.free_objects.push(object);
    }

    /// Referenced materials and raw bytes of a cell's auxiliary state.
    pub fn aux_contents(&self, position: Position) -> Option<(&[MaterialId], &[u8])> {
        self.cells
            .get(&position)
            .and_then(|c| c.aux.as_ref())
            .map(|aux| (aux.materials.as_slice(), aux.data.as_slice()))
    }

    /// Every free object currently in the world.
    pub fn free_objects(&self) -> &[FreeObject] {
        &self.free_objects
    }

    /// Number of writes waiting for [`WorldWrite::commit`].
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Number of commits performed so far.
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Returns `true` if `mark_modified` was called for `position`.
    pub fn is_modified(&self, position: Position) -> bool {
        self.modified.contains(&position)
    }

    /// Number of distinct positions marked modified.
    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    /// Number of cells holding anything other than air.
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|c| !c.is_empty()).count()
    }
}

impl WorldRead for VoxelWorld {
    fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    fn material(&self, position: Position, layer: Layer) -> MaterialId {
        self.cells
            .get(&position)
            .map_or(MaterialId::AIR, |cell| match layer {
                Layer::Base => cell.base,
                Layer::Fluid => cell.fluid,
            })
    }

    fn aux_state(&self, position: Position) -> Option<AuxState> {
        let aux = self.cells.get(&position)?.aux.as_ref()?;
        match postcard::to_allocvec(aux) {
            Ok(payload) => Some(AuxState {
                payload,
                materials: aux.materials.clone(),
            }),
            Err(e) => {
                tracing::warn!("failed to encode auxiliary state at {:?}: {}", position, e);
                None
            }
        }
    }

    fn decor(&self, position: Position) -> Option<DecorSet> {
        self.cells
            .get(&position)
            .filter(|cell| !cell.decor.is_empty())
            .map(|cell| cell.decor.clone())
    }

    fn free_objects_in(&self, bounds: &BlockBox) -> Vec<FreeObject> {
        self.free_objects
            .iter()
            .filter(|o| bounds.contains_point(o.position))
            .cloned()
            .collect()
    }
}

impl WorldWrite for VoxelWorld {
    fn set_material(&mut self, position: Position, layer: Layer, material: MaterialId) {
        self.pending
            .push(PendingWrite::Material(position, layer, material));
    }

    fn set_decor(&mut self, position: Position, slot: AttachmentId, material: MaterialId) {
        self.pending
            .push(PendingWrite::Decor(position, slot, material));
    }

    fn clear_decor(&mut self, position: Position) {
        self.pending.push(PendingWrite::ClearDecor(position));
    }

    fn clear_aux_state(&mut self, position: Position) {
        if let Some(cell) = self.cells.get_mut(&position) {
            cell.aux = None;
        }
    }

    fn restore_aux_state(
        &mut self,
        position: Position,
        payload: &[u8],
        remap: &MaterialRemap,
    ) -> Result<(), AuxStateError> {
        if self.material(position, Layer::Base).is_air() {
            return Err(AuxStateError::NoMaterial(position));
        }
        let mut aux: StoredAux =
            postcard::from_bytes(payload).map_err(|e| AuxStateError::Malformed {
                position,
                reason: e.to_string(),
            })?;
        for material in &mut aux.materials {
            *material = match remap.get(material) {
                Some(mapped) => *mapped,
                None => {
                    tracing::warn!(
                        "auxiliary state at {:?} references unmapped material {:?}",
                        position,
                        material
                    );
                    MaterialId::AIR
                }
            };
        }
        self.cells.entry(position).or_default().aux = Some(aux);
        Ok(())
    }

    fn spawn_free_object(&mut self, object: FreeObject) {
        self.free_objects.push(object);
    }

    fn mark_modified(&mut self, position: Position) {
        self.modified.insert(position);
    }

    fn commit(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for write in pending {
            match write {
                PendingWrite::Material(pos, layer, material) => self.put(pos, layer, material),
                PendingWrite::Decor(pos, slot, material) => self.put_decor(pos, slot, material),
                PendingWrite::ClearDecor(pos) => {
                    if let Some(cell) = self.cells.get_mut(&pos) {
                        cell.decor.clear();
                    }
                }
            }
        }
        self.cells.retain(|_, cell| !cell.is_empty());
        self.commits += 1;
        tracing::trace!("committed {} queued writes", count);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
