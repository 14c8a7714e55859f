//! Workflow errors.

use strata_schematic::{Axis, FormatError, PackError};

use crate::validation::ValidationReport;

/// Why a pack or unpack did not happen. The world is unchanged in every case.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The box failed validation; the report lists every offending cell.
    #[error("{} cells block this action", .0.len())]
    Rejected(ValidationReport),
    /// The region does not fit the schematic index.
    #[error("region is {extent} cells along {axis}; the limit is 1023")]
    SizeExceeded { axis: Axis, extent: u32 },
    /// The packer refused the captured region for another reason.
    #[error("failed to pack region: {0}")]
    Pack(#[source] PackError),
    /// The packed schematic could not be encoded.
    #[error("failed to encode schematic: {0}")]
    Encode(#[source] FormatError),
    /// The stored bytes are not a readable schematic.
    #[error("failed to read schematic: {0}")]
    DeserializationFailed(#[source] FormatError),
}

impl From<PackError> for WorkflowError {
    fn from(e: PackError) -> Self {
        match e {
            PackError::SizeExceeded { axis, extent } => WorkflowError::SizeExceeded { axis, extent },
            other => WorkflowError::Pack(other),
        }
    }
}

/// A colour string that is not hex ARGB.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid highlight colour: {0:?}")]
    Invalid(String),
}
