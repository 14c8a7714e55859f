//! Region schematics: capture a box of a voxel world, pack it into a
//! relocatable and world-independent form, persist it, and place it again.
//!
//! The pipeline is [`scan`] → [`pack`] → [`PackedSchematic::to_bytes`] →
//! [`PackedSchematic::from_bytes`] → [`place`].

pub mod error;
pub mod format;
pub mod index;
pub mod packer;
pub mod placer;
pub mod scanner;
pub mod schematic;
pub mod sparse;

pub use error::{Axis, FormatError, PackError};
pub use index::{AXIS_LIMIT, PackedIndex};
pub use packer::pack;
pub use placer::{PlacementReport, ReplaceMode, clear_region, place};
pub use scanner::{ScanOptions, scan};
pub use schematic::{PackedCell, PackedDecor, PackedSchematic, decode_free_object};
pub use sparse::SparseVoxelMap;
