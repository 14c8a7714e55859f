//! Box validation: every cell is checked and every violation is kept.

use strata_voxel::{MaterialCode, Position};

use crate::feedback::Notice;

/// What is wrong with one cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// The actor may not build here.
    AccessDenied,
    /// The cell holds a material on the deny list.
    DisallowedMaterial(MaterialCode),
    /// The cell is neither air nor replaceable.
    NotClearable,
    /// The floor cell has no solid top.
    NoSolidFloor,
}

impl ViolationKind {
    /// The notice this violation raises, if any. Access denials are reported
    /// by the host's claim system instead.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            ViolationKind::AccessDenied => None,
            ViolationKind::DisallowedMaterial(code) => Some(Notice::IllegalMaterial(code.clone())),
            ViolationKind::NotClearable => Some(Notice::ClearArea),
            ViolationKind::NoSolidFloor => Some(Notice::SolidGround),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub position: Position,
    pub kind: ViolationKind,
}

/// All violations of one box, in walk order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Runs `check` on every position and keeps each reported violation.
    pub fn collect<I, F>(positions: I, mut check: F) -> Self
    where
        I: IntoIterator<Item = Position>,
        F: FnMut(Position) -> Option<ViolationKind>,
    {
        let violations = positions
            .into_iter()
            .fold(Vec::new(), |mut found, position| {
                if let Some(kind) = check(position) {
                    found.push(Violation { position, kind });
                }
                found
            });
        Self { violations }
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Offending positions, in walk order.
    pub fn positions(&self) -> Vec<Position> {
        self.violations.iter().map(|v| v.position).collect()
    }

    /// Positions the actor had no access to.
    pub fn denied(&self) -> impl Iterator<Item = Position> + '_ {
        self.violations
            .iter()
            .filter(|v| v.kind == ViolationKind::AccessDenied)
            .map(|v| v.position)
    }

    /// The single notice to send: the first one in walk order, unless an
    /// access denial came before it. Every kind but a denial carries a
    /// notice, so only the first violation matters.
    pub fn first_notice(&self) -> Option<Notice> {
        self.violations.first().and_then(|v| v.kind.notice())
    }
}
