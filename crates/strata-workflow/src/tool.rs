//! The pack/unpack tool: turns a region around an anchor into bytes and back.
//!
//! Packing captures a box standing on the anchor, checks it, stores it and
//! clears it. Unpacking checks the box around a new anchor, clears it and
//! places the stored region centred on the anchor. Nothing is changed in the
//! world unless every check passes.

use std::time::{Duration, Instant};

use strata_config::ToolConfig;
use strata_schematic::{
    PackedSchematic, PlacementReport, ReplaceMode, ScanOptions, clear_region, pack, place, scan,
};
use strata_voxel::{BlockBox, Layer, Position, WorldRead, WorldWrite};

use crate::error::WorkflowError;
use crate::feedback::{FeedbackSink, HighlightColor, HighlightScheduler, Notice};
use crate::host::{ActorVitals, HostProbe, PositionStrategy, reduce_only_saturation};
use crate::policy::{ActorId, MaterialPolicy, PermissionValidator};
use crate::validation::{ValidationReport, ViolationKind};

/// Used when the configured colour does not parse.
const FALLBACK_HIGHLIGHT: HighlightColor = HighlightColor::from_argb(0x2FFF_0000);

/// Everything one pack or unpack needs from the host, passed per call.
pub struct Interaction<'a, W: ?Sized> {
    pub world: &'a mut W,
    pub actor: &'a ActorId,
    pub permissions: &'a dyn PermissionValidator,
    pub feedback: &'a mut dyn FeedbackSink,
    pub vitals: &'a mut dyn ActorVitals,
    pub now: Instant,
}

/// Result of a successful pack.
#[derive(Clone, Debug)]
pub struct PackOutcome {
    pub schematic: PackedSchematic,
    /// Serialized form, ready to store on the item.
    pub bytes: Vec<u8>,
}

/// Pack/unpack tool state for one host.
pub struct SchematicTool {
    config: ToolConfig,
    policy: MaterialPolicy,
    color: HighlightColor,
    highlight: HighlightScheduler,
    strategy: PositionStrategy,
}

impl SchematicTool {
    /// Builds the tool and probes the host once for its position model.
    pub fn new(config: ToolConfig, host: &dyn HostProbe) -> Self {
        let color = HighlightColor::parse(&config.highlight_error_color).unwrap_or_else(|e| {
            tracing::warn!("{}, using default", e);
            FALLBACK_HIGHLIGHT
        });
        Self {
            policy: MaterialPolicy::from_config(&config),
            highlight: HighlightScheduler::new(Duration::from_millis(
                config.highlight_duration_ms,
            )),
            strategy: PositionStrategy::probe(host),
            color,
            config,
        }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn policy(&self) -> &MaterialPolicy {
        &self.policy
    }

    pub fn highlight_pending(&self) -> bool {
        self.highlight.is_pending()
    }

    /// Clears an expired highlight. Call from the host's tick.
    pub fn poll_highlight(&mut self, feedback: &mut dyn FeedbackSink, now: Instant) -> bool {
        self.highlight.poll(feedback, now)
    }

    /// 1 when the anchor is a plant or loose rock, so the box sinks to include it.
    fn anchor_drop<W>(&self, world: &W, anchor: Position) -> i32
    where
        W: WorldRead + ?Sized,
    {
        let material = world.material(anchor, Layer::Base);
        let soft = world
            .registry()
            .get(material)
            .is_some_and(|def| self.policy.is_soft(def));
        i32::from(soft)
    }

    /// Box captured by [`SchematicTool::pack`] for this anchor.
    pub fn pack_bounds<W>(&self, world: &W, anchor: Position) -> BlockBox
    where
        W: WorldRead + ?Sized,
    {
        let (r, h) = (self.config.radius, self.config.effective_height());
        let dy0 = self.anchor_drop(world, anchor);
        BlockBox::new(anchor.add_xyz(-r, 1 - dy0, -r), anchor.add_xyz(r, h, r))
    }

    /// Box checked by [`SchematicTool::unpack`]; its bottom row is the floor.
    pub fn unpack_bounds<W>(&self, world: &W, anchor: Position) -> BlockBox
    where
        W: WorldRead + ?Sized,
    {
        let (r, h) = (self.config.radius, self.config.effective_height());
        let dy0 = self.anchor_drop(world, anchor);
        BlockBox::new(anchor.add_xyz(-r, -dy0, -r), anchor.add_xyz(r, h, r))
    }

    /// Captures, stores and clears the box above `anchor`.
    pub fn pack<W>(
        &mut self,
        ia: Interaction<'_, W>,
        anchor: Position,
    ) -> Result<PackOutcome, WorkflowError>
    where
        W: WorldWrite + ?Sized,
    {
        let anchor = self.strategy.resolve(anchor);
        let bounds = self.pack_bounds(&*ia.world, anchor);

        let report = self.validate_pack(&*ia.world, ia.actor, ia.permissions, &bounds);
        if !report.is_clean() {
            self.reject(ia.feedback, &report, ia.now);
            return Err(WorkflowError::Rejected(report));
        }

        let map = scan(&*ia.world, bounds.min, bounds.max, ScanOptions::default());
        let schematic = pack(map, bounds.min, ia.world.registry())?;
        let bytes = schematic
            .to_bytes(self.config.compress_threshold)
            .map_err(WorkflowError::Encode)?;

        clear_region(&mut *ia.world, &bounds);
        reduce_only_saturation(ia.vitals, self.config.build_effort);

        tracing::info!(
            "{} packed {:?} at {:?} into {} bytes",
            ia.actor,
            schematic.size,
            anchor,
            bytes.len()
        );
        Ok(PackOutcome { schematic, bytes })
    }

    /// Clears the box above `anchor` and places the stored region in it.
    pub fn unpack<W>(
        &mut self,
        ia: Interaction<'_, W>,
        anchor: Position,
        bytes: &[u8],
    ) -> Result<PlacementReport, WorkflowError>
    where
        W: WorldWrite + ?Sized,
    {
        let anchor = self.strategy.resolve(anchor);
        let bounds = self.unpack_bounds(&*ia.world, anchor);

        let report = self.validate_unpack(&*ia.world, ia.actor, ia.permissions, &bounds);
        if !report.is_clean() {
            self.reject(ia.feedback, &report, ia.now);
            return Err(WorkflowError::Rejected(report));
        }

        let schematic = match PackedSchematic::from_bytes(bytes) {
            Ok(schematic) => schematic,
            Err(e) => {
                tracing::warn!("{} tried to unpack unreadable data: {}", ia.actor, e);
                ia.feedback.notify(&Notice::UnpackError);
                return Err(WorkflowError::DeserializationFailed(e));
            }
        };

        let above_floor = BlockBox::new(bounds.min.add_xyz(0, 1, 0), bounds.max);
        clear_region(&mut *ia.world, &above_floor);

        let (sx, _, sz) = schematic.size;
        let origin = Position::in_dimension(
            anchor.x - (sx / 2) as i32,
            bounds.min.y + 1,
            anchor.z - (sz / 2) as i32,
            anchor.dimension,
        );
        let placed = place(&schematic, &mut *ia.world, origin, ReplaceMode::ReplaceAll);
        reduce_only_saturation(ia.vitals, self.config.build_effort);

        tracing::info!(
            "{} unpacked {:?} at {:?}: {} cells written",
            ia.actor,
            schematic.size,
            origin,
            placed.cells_written
        );
        Ok(placed)
    }

    fn validate_pack<W>(
        &self,
        world: &W,
        actor: &ActorId,
        permissions: &dyn PermissionValidator,
        bounds: &BlockBox,
    ) -> ValidationReport
    where
        W: WorldRead + ?Sized,
    {
        let registry = world.registry();
        ValidationReport::collect(bounds.positions(), |pos| {
            if !permissions.can_access(actor, pos) {
                return Some(ViolationKind::AccessDenied);
            }
            [Layer::Base, Layer::Fluid]
                .into_iter()
                .map(|layer| world.material(pos, layer))
                .filter(|m| !m.is_air())
                .filter_map(|m| registry.code(m))
                .find(|code| self.policy.is_disallowed(code))
                .map(|code| ViolationKind::DisallowedMaterial(code.clone()))
        })
    }

    fn validate_unpack<W>(
        &self,
        world: &W,
        actor: &ActorId,
        permissions: &dyn PermissionValidator,
        bounds: &BlockBox,
    ) -> ValidationReport
    where
        W: WorldRead + ?Sized,
    {
        let registry = world.registry();
        let floor_y = bounds.min.y;
        ValidationReport::collect(bounds.positions(), |pos| {
            if !permissions.can_access(actor, pos) {
                return Some(ViolationKind::AccessDenied);
            }
            let def = registry.get(world.material(pos, Layer::Base));
            if pos.y == floor_y {
                let solid = def.is_some_and(|d| d.solid_top);
                (self.config.require_floor && !solid).then_some(ViolationKind::NoSolidFloor)
            } else {
                let clear = def.is_some_and(|d| self.policy.is_replaceable_for_unpack(d));
                (!clear).then_some(ViolationKind::NotClearable)
            }
        })
    }

    fn reject(&mut self, feedback: &mut dyn FeedbackSink, report: &ValidationReport, now: Instant) {
        if let Some(notice) = report.first_notice() {
            feedback.notify(&notice);
        }
        self.highlight
            .show(feedback, &report.positions(), self.color, now);
        tracing::debug!("rejected: {} blocked cells", report.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoVitals;
    use crate::policy::AllowAll;
    use strata_voxel::{MaterialCode, MaterialDef, MaterialId, MaterialRegistry, VoxelWorld};

    struct Modern;

    impl HostProbe for Modern {
        fn supports_dimensions(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct Silent;

    impl FeedbackSink for Silent {
        fn highlight(&mut self, _: &[Position], _: HighlightColor) {}
        fn clear_highlight(&mut self) {}
        fn notify(&mut self, _: &Notice) {}
    }

    fn world() -> (VoxelWorld, MaterialId, MaterialId) {
        let mut registry = MaterialRegistry::new();
        let stone = registry
            .register(MaterialDef::solid(MaterialCode::parse("stone").unwrap()))
            .unwrap();
        let grass = registry
            .register(MaterialDef::soft(MaterialCode::parse("tallgrass").unwrap()))
            .unwrap();
        (VoxelWorld::new(registry), stone, grass)
    }

    fn tool(radius: i32, height: i32) -> SchematicTool {
        let config = ToolConfig {
            radius,
            height,
            ..ToolConfig::default()
        };
        SchematicTool::new(config, &Modern)
    }

    #[test]
    fn test_pack_box_stands_on_anchor() {
        let (w, _, _) = world();
        let a = Position::new(10, 64, 10);
        let b = tool(3, 7).pack_bounds(&w, a);
        assert_eq!(b.min, Position::new(7, 65, 7));
        assert_eq!(b.max, Position::new(13, 71, 13));
    }

    #[test]
    fn test_soft_anchor_sinks_box() {
        let (mut w, _, grass) = world();
        let a = Position::new(0, 10, 0);
        w.put(a, Layer::Base, grass);
        let t = tool(1, 7);
        assert_eq!(t.pack_bounds(&w, a).min.y, 10);
        assert_eq!(t.unpack_bounds(&w, a).min.y, 9);
    }

    #[test]
    fn test_height_never_below_three() {
        let (w, _, _) = world();
        let b = tool(0, 1).pack_bounds(&w, Position::new(0, 0, 0));
        assert_eq!(b.max.y, 3);
    }

    #[test]
    fn test_invalid_colour_falls_back() {
        let config = ToolConfig {
            highlight_error_color: "pink".into(),
            ..ToolConfig::default()
        };
        let t = SchematicTool::new(config, &Modern);
        assert_eq!(t.color, FALLBACK_HIGHLIGHT);
    }

    #[test]
    fn test_unreadable_bytes_leave_world_untouched() {
        let (mut w, stone, _) = world();
        let a = Position::new(0, 0, 0);
        for x in -1..=1 {
            for z in -1..=1 {
                w.put(Position::new(x, 0, z), Layer::Base, stone);
            }
        }
        let mut t = tool(1, 3);
        let actor = ActorId::new("tester");
        let result = t.unpack(
            Interaction {
                world: &mut w,
                actor: &actor,
                permissions: &AllowAll,
                feedback: &mut Silent,
                vitals: &mut NoVitals,
                now: Instant::now(),
            },
            a,
            b"garbage",
        );
        assert!(matches!(result, Err(WorkflowError::DeserializationFailed(_))));
        assert_eq!(w.commit_count(), 0);
        assert_eq!(w.occupied_cells(), 9);
    }
}
