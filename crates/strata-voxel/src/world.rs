//! The world interfaces the schematic engine consumes.
//!
//! [`WorldRead`] is a set of synchronous, side-effect-free queries.
//! [`WorldWrite`] adds batched mutation: writes are queued and become visible
//! to reads only after [`WorldWrite::commit`].

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::material::{Layer, MaterialId, MaterialRegistry};
use crate::position::{BlockBox, Position};

/// Face-and-subposition slot of a decorative attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttachmentId(pub u32);

impl AttachmentId {
    /// Number of faces a cell has.
    pub const FACES: u32 = 6;

    /// Builds the slot for `face` (0..6) and a sub-position on that face.
    pub fn new(face: u32, subposition: u32) -> Self {
        Self(face + subposition * Self::FACES)
    }

    pub fn face(self) -> u32 {
        self.0 % Self::FACES
    }

    pub fn subposition(self) -> u32 {
        self.0 / Self::FACES
    }
}

/// All decorative attachments of one cell.
pub type DecorSet = BTreeMap<AttachmentId, MaterialId>;

/// Source-world ID → destination-world ID, built from a schematic palette.
pub type MaterialRemap = FxHashMap<MaterialId, MaterialId>;

/// Extra cell state beyond the material ID, encoded by the material's own codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuxState {
    /// Opaque encoded payload.
    pub payload: Vec<u8>,
    /// Materials referenced from inside the payload (e.g. container contents).
    /// These need palette entries even if they never appear as a cell.
    pub materials: Vec<MaterialId>,
}

/// An out-of-grid object (item frame contents, creature, dropped item).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FreeObject {
    /// Host class name used to re-instantiate the object.
    pub class: String,
    /// Absolute location (or, inside a schematic, the offset from its minimal corner).
    pub position: [f64; 3],
    /// Opaque host-encoded state.
    pub data: Vec<u8>,
}

/// Failure to restore auxiliary state into a cell.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuxStateError {
    /// The cell has no committed material to attach state to.
    #[error("no material at {0:?} to attach state to")]
    NoMaterial(Position),
    /// The payload could not be decoded.
    #[error("malformed auxiliary payload at {position:?}: {reason}")]
    Malformed {
        /// Cell the payload was meant for.
        position: Position,
        /// Decoder message.
        reason: String,
    },
}

/// Read access to a live world.
pub trait WorldRead {
    /// The registry that gives this world's material IDs meaning.
    fn registry(&self) -> &MaterialRegistry;

    /// Material occupying `layer` at `position` (air when nothing is there).
    fn material(&self, position: Position, layer: Layer) -> MaterialId;

    /// Encoded extra state, if the cell has any.
    fn aux_state(&self, position: Position) -> Option<AuxState>;

    /// Decorative attachments, if the cell has any.
    fn decor(&self, position: Position) -> Option<DecorSet>;

    /// Free objects whose location falls inside `bounds`.
    fn free_objects_in(&self, bounds: &BlockBox) -> Vec<FreeObject>;
}

/// Batched write access to a live world.
pub trait WorldWrite: WorldRead {
    /// Queues a material write on one layer.
    fn set_material(&mut self, position: Position, layer: Layer, material: MaterialId);

    /// Queues a decor attachment write.
    fn set_decor(&mut self, position: Position, slot: AttachmentId, material: MaterialId);

    /// Queues removal of every decor attachment on a cell.
    fn clear_decor(&mut self, position: Position);

    /// Drops any auxiliary state on a cell.
    fn clear_aux_state(&mut self, position: Position);

    /// Decodes `payload` onto the committed material at `position`, translating
    /// embedded material IDs through `remap`.
    fn restore_aux_state(
        &mut self,
        position: Position,
        payload: &[u8],
        remap: &MaterialRemap,
    ) -> Result<(), AuxStateError>;

    /// Materializes a free object at its absolute location.
    fn spawn_free_object(&mut self, object: FreeObject);

    /// Invalidates caches and lighting for a cell.
    fn mark_modified(&mut self, position: Position);

    /// Flushes every queued write.
    fn commit(&mut self);
}
