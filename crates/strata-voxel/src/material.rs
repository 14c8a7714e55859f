//! Material registry: maps world-local [`MaterialId`] values to portable
//! [`MaterialCode`]s and the per-material metadata the schematic engine needs.
//!
//! The registry is owned by one world instance. Air is always ID 0 so that a
//! default cell represents empty space. Codes, not IDs, are what crosses world
//! boundaries: two worlds may assign different IDs to `game:stone`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain assumed for codes written without one (`stone` is `game:stone`).
pub const DEFAULT_DOMAIN: &str = "game";

/// Replaceability at or above which a material behaves like air.
pub const AIR_LIKE_REPLACEABILITY: u16 = 9505;

/// Replaceability band of "soft" materials (small plants, loose rock).
pub const SOFT_REPLACEABILITY: std::ops::RangeInclusive<u16> = 5500..=6500;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact identifier of a material, valid only inside one world instance.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// Air / empty cell.
    pub const AIR: Self = Self(0);

    pub fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Occupancy plane of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Solid content.
    Base,
    /// Liquid overlay.
    Fluid,
}

/// A portable `domain:path` material identifier.
///
/// Either part may contain `*` wildcards when the code is used as a
/// [`CodePattern`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaterialCode {
    domain: String,
    path: String,
}

impl MaterialCode {
    /// Builds a code from explicit parts.
    pub fn new(domain: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
        }
    }

    /// Parses `domain:path` or a bare `path` (domain defaults to [`DEFAULT_DOMAIN`]).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidCode`] for empty parts or more than one `:`.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let raw = raw.trim();
        let (domain, path) = match raw.split_once(':') {
            Some((domain, path)) => (domain, path),
            None => (DEFAULT_DOMAIN, raw),
        };
        if domain.is_empty() || path.is_empty() || path.contains(':') {
            return Err(RegistryError::InvalidCode(raw.to_string()));
        }
        Ok(Self::new(domain, path))
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for MaterialCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.path)
    }
}

impl FromStr for MaterialCode {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MaterialCode {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MaterialCode> for String {
    fn from(code: MaterialCode) -> Self {
        code.to_string()
    }
}

/// A deny-list style code pattern, compiled once.
///
/// `*` in either part matches any run of characters, including none.
/// A pattern without `*` matches exactly one code.
#[derive(Clone, Debug)]
pub struct CodePattern {
    code: MaterialCode,
    regex: Regex,
}

impl CodePattern {
    /// # Errors
    ///
    /// [`RegistryError::InvalidPattern`] if the pattern does not compile.
    pub fn compile(code: MaterialCode) -> Result<Self, RegistryError> {
        let part = |raw: &str| {
            raw.split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*")
        };
        let source = format!("^{}:{}$", part(&code.domain), part(&code.path));
        let regex = Regex::new(&source).map_err(|e| RegistryError::InvalidPattern {
            pattern: code.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { code, regex })
    }

    /// Parses and compiles in one step.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        Self::compile(MaterialCode::parse(raw)?)
    }

    pub fn code(&self) -> &MaterialCode {
        &self.code
    }

    pub fn matches(&self, code: &MaterialCode) -> bool {
        self.regex.is_match(&code.to_string())
    }
}

/// Full descriptor for a material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Portable identity (e.g. `game:stone`).
    pub code: MaterialCode,
    /// Which occupancy plane this material is placed into.
    pub layer: Layer,
    /// How readily other content may overwrite this material (0..=9999).
    pub replaceability: u16,
    /// Whether the top face is solid enough to stand on.
    pub solid_top: bool,
}

impl MaterialDef {
    /// A solid, non-replaceable base material.
    pub fn solid(code: MaterialCode) -> Self {
        Self {
            code,
            layer: Layer::Base,
            replaceability: 0,
            solid_top: true,
        }
    }

    /// A fluid-layer material.
    pub fn fluid(code: MaterialCode) -> Self {
        Self {
            code,
            layer: Layer::Fluid,
            replaceability: 9500,
            solid_top: false,
        }
    }

    /// A soft base material that does not support anything on top.
    pub fn soft(code: MaterialCode) -> Self {
        Self {
            code,
            layer: Layer::Base,
            replaceability: 6000,
            solid_top: false,
        }
    }

    pub fn is_air_like(&self) -> bool {
        self.replaceability >= AIR_LIKE_REPLACEABILITY
    }

    pub fn is_soft(&self) -> bool {
        SOFT_REPLACEABILITY.contains(&self.replaceability)
    }
}

/// Errors that can occur during material registration or code parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A material with the same code has already been registered.
    #[error("duplicate material code: {0}")]
    DuplicateCode(MaterialCode),
    /// Every ID has been consumed.
    #[error("material registry is full")]
    RegistryFull,
    /// The text is not a valid `domain:path` code.
    #[error("invalid material code: {0:?}")]
    InvalidCode(String),
    /// A wildcard code could not be compiled.
    #[error("invalid material pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`MaterialId`] → [`MaterialDef`] with O(1) lookup by index and
/// O(1) reverse lookup by code.
#[derive(Clone, Debug)]
pub struct MaterialRegistry {
    /// Dense array where `index == MaterialId.0`.
    defs: Vec<MaterialDef>,
    code_to_id: HashMap<MaterialCode, MaterialId>,
}

impl MaterialRegistry {
    /// Creates a registry with `game:air` pre-registered as ID 0.
    pub fn new() -> Self {
        let air = MaterialDef {
            code: MaterialCode::new(DEFAULT_DOMAIN, "air"),
            layer: Layer::Base,
            replaceability: 9999,
            solid_top: false,
        };

        let mut code_to_id = HashMap::new();
        code_to_id.insert(air.code.clone(), MaterialId::AIR);

        Self {
            defs: vec![air],
            code_to_id,
        }
    }

    /// Registers a material and returns its sequentially assigned ID.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateCode`] if the code is taken, or
    /// [`RegistryError::RegistryFull`] when the ID space is exhausted.
    pub fn register(&mut self, def: MaterialDef) -> Result<MaterialId, RegistryError> {
        if self.code_to_id.contains_key(&def.code) {
            return Err(RegistryError::DuplicateCode(def.code));
        }
        let next = u32::try_from(self.defs.len()).map_err(|_| RegistryError::RegistryFull)?;

        let id = MaterialId(next);
        self.code_to_id.insert(def.code.clone(), id);
        self.defs.push(def);
        Ok(id)
    }

    /// Returns the definition for an ID, or `None` if the ID is unknown.
    pub fn get(&self, id: MaterialId) -> Option<&MaterialDef> {
        self.defs.get(id.0 as usize)
    }

    /// Returns the code for an ID.
    pub fn code(&self, id: MaterialId) -> Option<&MaterialCode> {
        self.get(id).map(|def| &def.code)
    }

    /// Returns the ID registered under `code`.
    pub fn lookup(&self, code: &MaterialCode) -> Option<MaterialId> {
        self.code_to_id.get(code).copied()
    }

    /// Total number of registered materials (including air).
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.defs.len() <= 1
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
