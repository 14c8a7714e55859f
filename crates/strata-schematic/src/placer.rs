//! Writes a [`PackedSchematic`] back into a world, and clears regions ahead of it.
//!
//! Placement runs in three phases, each finished before the next starts:
//! 1. base/fluid materials, then decor, committed as one batch;
//! 2. auxiliary state, decoded onto the now-committed materials;
//! 3. free objects.

use strata_voxel::{BlockBox, Layer, MaterialId, MaterialRemap, Position, WorldWrite};

use crate::schematic::{PackedSchematic, decode_free_object};

/// Conflict policy for a destination cell that already holds content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Always overwrite the destination layer.
    #[default]
    ReplaceAll,
    /// Overwrite, except never write air.
    ReplaceAllNoAir,
    /// Only write into a destination layer that is currently air.
    ReplaceOnlyAir,
}

impl ReplaceMode {
    /// Whether `incoming` may replace `existing` on one layer.
    pub fn allows(self, existing: MaterialId, incoming: MaterialId) -> bool {
        match self {
            ReplaceMode::ReplaceAll => true,
            ReplaceMode::ReplaceAllNoAir => !incoming.is_air(),
            ReplaceMode::ReplaceOnlyAir => existing.is_air(),
        }
    }
}

/// What a [`place`] call wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlacementReport {
    /// Absolute position of the schematic's minimal corner.
    pub origin: Option<Position>,
    pub cells_written: usize,
    /// Layer writes the replace mode declined.
    pub cells_skipped: usize,
    pub decor_written: usize,
    pub payloads_restored: usize,
    pub payloads_failed: usize,
    pub free_objects_spawned: usize,
    pub free_objects_failed: usize,
    /// Palette codes unknown to the destination world.
    pub unresolved: usize,
}

/// Places `schematic` so that its logical origin lands on `target_origin`.
///
/// The minimal corner is written at `target_origin + packed_offset`.
/// The caller is expected to have cleared and validated the target region.
pub fn place<W>(
    schematic: &PackedSchematic,
    world: &mut W,
    target_origin: Position,
    mode: ReplaceMode,
) -> PlacementReport
where
    W: WorldWrite + ?Sized,
{
    let origin = target_origin + schematic.packed_offset;
    let mut report = PlacementReport {
        origin: Some(origin),
        ..PlacementReport::default()
    };

    let remap = resolve_palette(schematic, world, &mut report);

    // Phase 1: materials, then decor.
    for cell in &schematic.cells {
        let Some(material) = remap.get(&cell.material).copied() else {
            continue;
        };
        let pos = origin + cell.index.to_offset();
        let existing = world.material(pos, cell.layer);
        if !mode.allows(existing, material) {
            report.cells_skipped += 1;
            continue;
        }
        world.set_material(pos, cell.layer, material);
        world.mark_modified(pos);
        report.cells_written += 1;
    }

    for decor in &schematic.decor {
        let Some(material) = remap.get(&decor.material).copied() else {
            continue;
        };
        let pos = origin + decor.index.to_offset();
        world.set_decor(pos, decor.slot, material);
        world.mark_modified(pos);
        report.decor_written += 1;
    }
    world.commit();

    // Phase 2: state needs the committed materials underneath it.
    for (index, payload) in &schematic.aux_payloads {
        let pos = origin + index.to_offset();
        match world.restore_aux_state(pos, payload, &remap) {
            Ok(()) => {
                world.mark_modified(pos);
                report.payloads_restored += 1;
            }
            Err(e) => {
                tracing::warn!("skipping cell state: {}", e);
                report.payloads_failed += 1;
            }
        }
    }

    // Phase 3: free objects.
    for blob in &schematic.free_objects {
        match decode_free_object(blob) {
            Ok(mut object) => {
                object.position[0] += origin.x as f64;
                object.position[1] += origin.y as f64;
                object.position[2] += origin.z as f64;
                world.spawn_free_object(object);
                report.free_objects_spawned += 1;
            }
            Err(e) => {
                tracing::warn!("skipping undecodable free object: {}", e);
                report.free_objects_failed += 1;
            }
        }
    }
    world.commit();

    tracing::debug!("placed schematic at {:?}: {:?}", origin, report);
    report
}

/// Maps every palette entry to a destination ID by code.
fn resolve_palette<W>(
    schematic: &PackedSchematic,
    world: &W,
    report: &mut PlacementReport,
) -> MaterialRemap
where
    W: WorldWrite + ?Sized,
{
    let registry = world.registry();
    let mut remap = MaterialRemap::default();
    for (source, code) in &schematic.palette {
        match registry.lookup(code) {
            Some(dest) => {
                remap.insert(*source, dest);
            }
            None => {
                tracing::warn!("material {} is unknown here; its cells are skipped", code);
                report.unresolved += 1;
            }
        }
    }
    remap
}

/// Empties every occupied cell of `bounds`: both layers, decor and state.
///
/// All writes go out in a single commit. Returns the number of cells cleared.
pub fn clear_region<W>(world: &mut W, bounds: &BlockBox) -> usize
where
    W: WorldWrite + ?Sized,
{
    let mut cleared = 0;
    for pos in bounds.positions() {
        let occupied = !world.material(pos, Layer::Base).is_air()
            || !world.material(pos, Layer::Fluid).is_air()
            || world.decor(pos).is_some()
            || world.aux_state(pos).is_some();
        if !occupied {
            continue;
        }
        world.set_material(pos, Layer::Base, MaterialId::AIR);
        world.set_material(pos, Layer::Fluid, MaterialId::AIR);
        world.clear_decor(pos);
        world.clear_aux_state(pos);
        world.mark_modified(pos);
        cleared += 1;
    }
    world.commit();
    tracing::debug!("cleared {} cells in {:?}..={:?}", cleared, bounds.min, bounds.max);
    cleared
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::pack;
    use crate::scanner::{ScanOptions, scan};
    use strata_voxel::{
        AttachmentId, FreeObject, MaterialCode, MaterialDef, MaterialRegistry, VoxelWorld,
        WorldRead,
    };

    struct Ids {
        stone: MaterialId,
        water: MaterialId,
        moss: MaterialId,
    }

    fn world_with(order: &[&str]) -> (VoxelWorld, Ids) {
        let mut registry = MaterialRegistry::new();
        for name in order {
            let code = MaterialCode::parse(name).unwrap();
            let def = if *name == "water" {
                MaterialDef::fluid(code)
            } else {
                MaterialDef::solid(code)
            };
            registry.register(def).unwrap();
        }
        let id = |n: &str| registry.lookup(&MaterialCode::parse(n).unwrap()).unwrap();
        let ids = Ids {
            stone: id("stone"),
            water: id("water"),
            moss: id("moss"),
        };
        (VoxelWorld::new(registry), ids)
    }

    #[test]
    fn test_replace_mode_predicates() {
        let (air, stone) = (MaterialId::AIR, MaterialId(1));
        assert!(ReplaceMode::ReplaceAll.allows(stone, air));
        assert!(!ReplaceMode::ReplaceAllNoAir.allows(stone, air));
        assert!(ReplaceMode::ReplaceAllNoAir.allows(air, stone));
        assert!(ReplaceMode::ReplaceOnlyAir.allows(air, stone));
        assert!(!ReplaceMode::ReplaceOnlyAir.allows(stone, stone));
    }

    #[test]
    fn test_round_trip_across_registries() {
        let (mut src, a) = world_with(&["stone", "water", "moss"]);
        let origin = Position::new(20, 64, 20);
        let p = origin.add_xyz(1, 0, 1);
        src.put(origin, Layer::Base, a.stone);
        src.put(p, Layer::Base, a.stone);
        src.put(p, Layer::Fluid, a.water);
        src.put_decor(p, AttachmentId::new(1, 0), a.moss);
        src.put_aux(p, vec![a.moss], vec![42]);

        let map = scan(&src, origin, origin.add_xyz(2, 2, 2), ScanOptions::default());
        let schematic = pack(map, origin, src.registry()).unwrap();

        // Destination assigns different IDs to the same codes.
        let (mut dst, b) = world_with(&["moss", "water", "stone"]);
        let target = Position::in_dimension(-5, 10, 300, 2);
        let report = place(&schematic, &mut dst, target, ReplaceMode::ReplaceAll);

        let q = target.add_xyz(1, 0, 1);
        assert_eq!(dst.material(target, Layer::Base), b.stone);
        assert_eq!(dst.material(q, Layer::Base), b.stone);
        assert_eq!(dst.material(q, Layer::Fluid), b.water);
        assert_eq!(dst.decor(q).unwrap()[&AttachmentId::new(1, 0)], b.moss);
        assert_eq!(dst.aux_contents(q), Some((&[b.moss][..], &[42u8][..])));
        assert_eq!(report.cells_written, 3);
        assert_eq!(report.decor_written, 1);
        assert_eq!(report.payloads_restored, 1);
        assert_eq!(report.unresolved, 0);
        assert_eq!(report.origin, Some(target));
    }

    #[test]
    fn test_cells_return_to_their_captured_layer() {
        let mut registry = MaterialRegistry::new();
        for def in [
            MaterialDef::solid(MaterialCode::parse("stone").unwrap()),
            MaterialDef::solid(MaterialCode::parse("lakeice").unwrap()),
            MaterialDef::fluid(MaterialCode::parse("water").unwrap()),
        ] {
            registry.register(def).unwrap();
        }
        let id = |n: &str| registry.lookup(&MaterialCode::parse(n).unwrap()).unwrap();
        let (stone, ice, water) = (id("stone"), id("lakeice"), id("water"));
        let mut src = VoxelWorld::new(registry.clone());

        // A solid sitting in the fluid layer, and a fluid held in the base layer.
        let a = Position::new(0, 0, 0);
        let b = Position::new(1, 0, 0);
        src.put(a, Layer::Base, stone);
        src.put(a, Layer::Fluid, ice);
        src.put(b, Layer::Base, water);

        let schematic = pack(scan(&src, a, b, ScanOptions::default()), a, src.registry()).unwrap();
        let mut dst = VoxelWorld::new(registry);
        let target = Position::new(40, 5, 40);
        let report = place(&schematic, &mut dst, target, ReplaceMode::ReplaceAll);

        let (a2, b2) = (target, target.add_xyz(1, 0, 0));
        assert_eq!(dst.material(a2, Layer::Base), stone);
        assert_eq!(dst.material(a2, Layer::Fluid), ice);
        assert_eq!(dst.material(b2, Layer::Base), water);
        assert_eq!(dst.material(b2, Layer::Fluid), MaterialId::AIR);
        assert_eq!(report.cells_written, 3);
    }

    #[test]
    fn test_packed_offset_applied_on_place() {
        let (mut src, a) = world_with(&["stone", "water", "moss"]);
        let p = Position::new(5, 5, 5);
        src.put(p, Layer::Base, a.stone);
        let mut map = scan(&src, p, p, ScanOptions::default());
        map.fluid.clear();
        let schematic = pack(map, Position::new(3, 4, 5), src.registry()).unwrap();

        let (mut dst, b) = world_with(&["stone", "water", "moss"]);
        place(&schematic, &mut dst, Position::new(0, 0, 0), ReplaceMode::ReplaceAll);
        assert_eq!(dst.material(Position::new(2, 1, 0), Layer::Base), b.stone);
    }

    #[test]
    fn test_payload_restored_after_material_commit() {
        let (mut src, a) = world_with(&["stone", "water", "moss"]);
        let p = Position::new(0, 0, 0);
        src.put(p, Layer::Base, a.stone);
        src.put_aux(p, vec![], vec![1]);
        let schematic = pack(scan(&src, p, p, ScanOptions::default()), p, src.registry()).unwrap();

        // Destination is empty: state only succeeds because phase 1 committed first.
        let (mut dst, _) = world_with(&["stone", "water", "moss"]);
        let report = place(&schematic, &mut dst, p, ReplaceMode::ReplaceAll);
        assert_eq!(report.payloads_restored, 1);
        assert_eq!(report.payloads_failed, 0);
        assert_eq!(dst.commit_count(), 2);
    }

    #[test]
    fn test_replace_only_air_keeps_existing() {
        let (mut src, a) = world_with(&["stone", "water", "moss"]);
        let p = Position::new(0, 0, 0);
        src.put(p, Layer::Base, a.stone);
        let schematic = pack(scan(&src, p, p, ScanOptions::default()), p, src.registry()).unwrap();

        let (mut dst, b) = world_with(&["stone", "water", "moss"]);
        dst.put(p, Layer::Base, b.moss);
        let report = place(&schematic, &mut dst, p, ReplaceMode::ReplaceOnlyAir);
        assert_eq!(dst.material(p, Layer::Base), b.moss);
        assert_eq!(report.cells_skipped, 1);
        assert_eq!(report.cells_written, 0);
    }

    #[test]
    fn test_unknown_codes_skipped() {
        let (mut src, a) = world_with(&["stone", "water", "moss"]);
        let p = Position::new(0, 0, 0);
        src.put(p, Layer::Base, a.moss);
        let schematic = pack(scan(&src, p, p, ScanOptions::default()), p, src.registry()).unwrap();

        let mut registry = MaterialRegistry::new();
        registry
            .register(MaterialDef::solid(MaterialCode::parse("stone").unwrap()))
            .unwrap();
        let mut dst = VoxelWorld::new(registry);
        let report = place(&schematic, &mut dst, p, ReplaceMode::ReplaceAll);
        assert_eq!(report.unresolved, 1);
        assert_eq!(report.cells_written, 0);
        assert_eq!(dst.material(p, Layer::Base), MaterialId::AIR);
    }

    #[test]
    fn test_free_objects_materialized_at_target() {
        let (mut src, a) = world_with(&["stone", "water", "moss"]);
        let origin = Position::new(10, 10, 10);
        src.put(origin, Layer::Base, a.stone);
        src.put_free_object(FreeObject {
            class: "itemframe".into(),
            position: [11.5, 10.0, 10.5],
            data: vec![3],
        });
        let map = scan(
            &src,
            origin,
            origin.add_xyz(1, 1, 1),
            ScanOptions {
                include_free_objects: true,
            },
        );
        let schematic = pack(map, origin, src.registry()).unwrap();

        let (mut dst, _) = world_with(&["stone", "water", "moss"]);
        let report = place(&schematic, &mut dst, Position::new(0, 0, 0), ReplaceMode::ReplaceAll);
        assert_eq!(report.free_objects_spawned, 1);
        assert_eq!(dst.free_objects()[0].position, [1.5, 0.0, 0.5]);
    }

    #[test]
    fn test_clear_region_empties_all_layers_in_one_commit() {
        let (mut w, a) = world_with(&["stone", "water", "moss"]);
        let p = Position::new(1, 1, 1);
        w.put(p, Layer::Base, a.stone);
        w.put(p, Layer::Fluid, a.water);
        w.put_decor(Position::new(0, 0, 0), AttachmentId(0), a.moss);
        w.put_aux(p, vec![], vec![]);
        w.put(Position::new(9, 9, 9), Layer::Base, a.stone);

        let bounds = BlockBox::new(Position::new(0, 0, 0), Position::new(2, 2, 2));
        assert_eq!(clear_region(&mut w, &bounds), 2);
        assert_eq!(w.commit_count(), 1);
        assert_eq!(w.material(p, Layer::Base), MaterialId::AIR);
        assert_eq!(w.material(p, Layer::Fluid), MaterialId::AIR);
        assert!(w.decor(Position::new(0, 0, 0)).is_none());
        assert!(w.aux_state(p).is_none());
        assert_eq!(w.material(Position::new(9, 9, 9), Layer::Base), a.stone);
    }
}
