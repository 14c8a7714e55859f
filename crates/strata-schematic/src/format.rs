//! Persisted forms of a [`PackedSchematic`].
//!
//! ## Binary Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Magic bytes `"STSC"` |
//! | 4 | 1 | Format version (`u8`, currently 1) |
//! | 5 | 1 | Compression flag (`0x00` none, `0x01` LZ4 with prepended size) |
//! | 6 | N | postcard-encoded schematic body |
//!
//! Bodies smaller than the caller's threshold are stored uncompressed.
//! A human-readable JSON form is offered as well. Both readers validate
//! the decoded schematic before returning it.

use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::error::FormatError;
use crate::schematic::PackedSchematic;

/// Magic bytes identifying a serialized schematic.
pub const MAGIC: [u8; 4] = *b"STSC";

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Compression flag: body is stored as-is.
pub const COMPRESSION_FLAG_NONE: u8 = 0x00;

/// Compression flag: body is LZ4-compressed.
pub const COMPRESSION_FLAG_LZ4: u8 = 0x01;

const HEADER_LEN: usize = MAGIC.len() + 2;

impl PackedSchematic {
    /// Encodes to the binary format, compressing bodies of `compress_threshold` bytes or more.
    ///
    /// # Errors
    ///
    /// [`FormatError::Codec`] if the body cannot be encoded.
    pub fn to_bytes(&self, compress_threshold: usize) -> Result<Vec<u8>, FormatError> {
        let body = postcard::to_allocvec(self)?;

        let (flag, body) = if body.len() >= compress_threshold {
            (COMPRESSION_FLAG_LZ4, compress_prepend_size(&body))
        } else {
            (COMPRESSION_FLAG_NONE, body)
        };

        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        out.push(flag);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decodes and validates the binary format.
    ///
    /// # Errors
    ///
    /// Any [`FormatError`]; nothing partial is returned.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < HEADER_LEN {
            return Err(FormatError::Truncated {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        if data[..4] != MAGIC {
            return Err(FormatError::InvalidMagic);
        }
        if data[4] != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion(data[4]));
        }

        let body = &data[HEADER_LEN..];
        let schematic: PackedSchematic = match data[5] {
            COMPRESSION_FLAG_NONE => postcard::from_bytes(body)?,
            COMPRESSION_FLAG_LZ4 => {
                let raw = decompress_size_prepended(body)
                    .map_err(|e| FormatError::Decompress(e.to_string()))?;
                postcard::from_bytes(&raw)?
            }
            flag => return Err(FormatError::UnknownCompression(flag)),
        };

        schematic.validate()?;
        Ok(schematic)
    }

    /// Encodes as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// [`FormatError::Json`] on encoder failure.
    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes and validates JSON produced by [`PackedSchematic::to_json`].
    ///
    /// # Errors
    ///
    /// [`FormatError::Json`] for malformed text, [`FormatError::Invalid`] for
    /// a well-formed but inconsistent schematic.
    pub fn from_json(text: &str) -> Result<Self, FormatError> {
        let schematic: PackedSchematic = serde_json::from_str(text)?;
        schematic.validate()?;
        Ok(schematic)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
