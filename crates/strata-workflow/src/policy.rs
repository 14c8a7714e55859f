//! Access and material predicates consulted before packing or unpacking.

use std::fmt;

use strata_config::ToolConfig;
use strata_voxel::{CodePattern, MaterialCode, MaterialDef, Position};

/// Identity of whoever triggered a pack or unpack.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host-side land-claim check, asked once per cell of a box.
pub trait PermissionValidator {
    fn can_access(&self, actor: &ActorId, position: Position) -> bool;
}

impl<F> PermissionValidator for F
where
    F: Fn(&ActorId, Position) -> bool,
{
    fn can_access(&self, actor: &ActorId, position: Position) -> bool {
        self(actor, position)
    }
}

/// Grants everything. For single-player hosts without claims.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl PermissionValidator for AllowAll {
    fn can_access(&self, _actor: &ActorId, _position: Position) -> bool {
        true
    }
}

/// Deny list and replaceability rules.
#[derive(Clone, Debug, Default)]
pub struct MaterialPolicy {
    banned: Vec<CodePattern>,
    replace_soft: bool,
}

impl MaterialPolicy {
    pub fn new(banned: Vec<CodePattern>, replace_soft: bool) -> Self {
        Self {
            banned,
            replace_soft,
        }
    }

    /// Builds the policy from config, compiling every deny-list entry once.
    /// Unparseable entries are skipped.
    pub fn from_config(config: &ToolConfig) -> Self {
        let banned = config
            .banned_materials
            .iter()
            .filter_map(|raw| match CodePattern::parse(raw) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!("ignoring banned material entry: {}", e);
                    None
                }
            })
            .collect();
        Self::new(banned, config.replace_soft_materials)
    }

    /// Exact or wildcard match against the deny list.
    pub fn is_disallowed(&self, code: &MaterialCode) -> bool {
        self.banned.iter().any(|pattern| pattern.matches(code))
    }

    /// Whether unpacking may overwrite a cell holding `def`.
    pub fn is_replaceable_for_unpack(&self, def: &MaterialDef) -> bool {
        def.is_air_like() || (self.replace_soft && def.is_soft())
    }

    /// Small vegetation or loose rock, regardless of configuration.
    pub fn is_soft(&self, def: &MaterialDef) -> bool {
        def.is_soft()
    }

    pub fn banned(&self) -> &[CodePattern] {
        &self.banned
    }
}
