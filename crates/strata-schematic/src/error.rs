//! Error types for packing and for reading serialized schematics.

use std::fmt;

use strata_voxel::MaterialId;

/// A spatial axis, used to report which extent was too large.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Errors raised by the packer. No partial schematic is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// The bounding box needs 1024 or more cells along an axis.
    #[error("region is {extent} cells along {axis}; the limit is 1023")]
    SizeExceeded {
        /// Offending axis.
        axis: Axis,
        /// Cells along that axis.
        extent: u32,
    },
    /// The map contains no cells at all.
    #[error("nothing to pack")]
    EmptyRegion,
    /// A material ID has no code in the source registry.
    #[error("material {0:?} has no registered code")]
    UnknownMaterial(MaterialId),
    /// A free object could not be encoded.
    #[error("failed to encode free object: {0}")]
    FreeObject(#[from] postcard::Error),
}

/// Errors raised while reading a serialized schematic.
///
/// Every variant means the input is unusable; it is reported before anything
/// is written to a world.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The data does not start with the expected magic bytes.
    #[error("invalid magic bytes")]
    InvalidMagic,
    /// The format version is not supported by this build.
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),
    /// The data is shorter than its header.
    #[error("data truncated: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum expected byte count.
        expected: usize,
        /// Actual byte count received.
        actual: usize,
    },
    /// An unknown compression flag byte was encountered.
    #[error("unknown compression flag: 0x{0:02X}")]
    UnknownCompression(u8),
    /// LZ4 decompression failed.
    #[error("LZ4 decompression failed: {0}")]
    Decompress(String),
    /// Binary body could not be encoded or decoded.
    #[error("binary codec error: {0}")]
    Codec(#[from] postcard::Error),
    /// JSON text could not be encoded or decoded.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),
    /// The decoded schematic violates a structural invariant.
    #[error("invalid schematic: {0}")]
    Invalid(String),
}
