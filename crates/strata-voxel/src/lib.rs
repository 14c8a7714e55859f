//! Voxel world primitives: cell positions, the material registry, and the
//! read/write world interfaces the schematic engine runs against.

pub mod material;
pub mod memory;
pub mod position;
pub mod world;

pub use material::{
    CodePattern, Layer, MaterialCode, MaterialDef, MaterialId, MaterialRegistry, RegistryError,
};
pub use memory::VoxelWorld;
pub use position::{BlockBox, BoxWalk, Offset, Position};
pub use world::{
    AttachmentId, AuxState, AuxStateError, DecorSet, FreeObject, MaterialRemap, WorldRead,
    WorldWrite,
};
