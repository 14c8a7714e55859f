//! Region capture: walks a live box and records every cell into a [`SparseVoxelMap`].

use strata_voxel::{BlockBox, Layer, MaterialId, Position, WorldRead};

use crate::sparse::SparseVoxelMap;

/// Knobs for [`scan`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Also capture free objects whose location falls inside the box.
    pub include_free_objects: bool,
}

/// Captures the inclusive box spanned by `start` and `end` (either corner order).
///
/// Air cells are recorded too: dropping them would shrink the bounding box
/// computed by the packer and shift the schematic relative to its origin.
/// The world is only read.
pub fn scan<W>(world: &W, start: Position, end: Position, options: ScanOptions) -> SparseVoxelMap
where
    W: WorldRead + ?Sized,
{
    let bounds = BlockBox::new(start, end);
    let mut map = SparseVoxelMap::new();

    for pos in bounds.positions() {
        let base = world.material(pos, Layer::Base);
        let mut fluid = world.material(pos, Layer::Fluid);
        // Non-layered hosts answer both queries with the same material.
        if fluid == base {
            fluid = MaterialId::AIR;
        }
        map.base.insert(pos, base);
        map.fluid.insert(pos, fluid);

        if let Some(state) = world.aux_state(pos) {
            map.payload_materials.extend(state.materials);
            map.aux.insert(pos, state.payload);
        }

        if let Some(decor) = world.decor(pos).filter(|d| !d.is_empty()) {
            map.decor.insert(pos, decor);
        }
    }

    if options.include_free_objects {
        map.free_objects = world.free_objects_in(&bounds);
    }

    tracing::debug!(
        "scanned {:?}..={:?}: {} cells, {} with state, {} decorated, {} free objects",
        bounds.min,
        bounds.max,
        bounds.volume(),
        map.aux.len(),
        map.decor.len(),
        map.free_objects.len()
    );
    map
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strata_voxel::{
        AttachmentId, FreeObject, MaterialCode, MaterialDef, MaterialRegistry, VoxelWorld,
    };

    fn world() -> (VoxelWorld, MaterialId, MaterialId) {
        let mut registry = MaterialRegistry::new();
        let stone = registry
            .register(MaterialDef::solid(MaterialCode::parse("stone").unwrap()))
            .unwrap();
        let water = registry
            .register(MaterialDef::fluid(MaterialCode::parse("water").unwrap()))
            .unwrap();
        (VoxelWorld::new(registry), stone, water)
    }

    #[test]
    fn test_scan_records_every_cell_including_air() {
        let (w, _, _) = world();
        let map = scan(
            &w,
            Position::new(0, 0, 0),
            Position::new(2, 2, 2),
            ScanOptions::default(),
        );
        assert_eq!(map.base.len(), 27);
        assert_eq!(map.fluid.len(), 27);
        assert!(map.base.values().all(|m| m.is_air()));
    }

    #[test]
    fn test_scan_accepts_reversed_corners() {
        let (mut w, stone, _) = world();
        w.put(Position::new(-1, 5, 2), Layer::Base, stone);
        let map = scan(
            &w,
            Position::new(0, 5, 2),
            Position::new(-1, 4, 3),
            ScanOptions::default(),
        );
        assert_eq!(map.len(), 8);
        assert_eq!(map.base[&Position::new(-1, 5, 2)], stone);
    }

    #[test]
    fn test_fluid_equal_to_base_is_cleared() {
        let (mut w, stone, water) = world();
        let p = Position::new(0, 0, 0);
        w.put(p, Layer::Base, water);
        w.put(p, Layer::Fluid, water);
        let q = Position::new(1, 0, 0);
        w.put(q, Layer::Base, stone);
        w.put(q, Layer::Fluid, water);

        let map = scan(&w, p, q, ScanOptions::default());
        assert_eq!(map.base[&p], water);
        assert_eq!(map.fluid[&p], MaterialId::AIR);
        assert_eq!(map.base[&q], stone);
        assert_eq!(map.fluid[&q], water);
    }

    #[test]
    fn test_scan_records_state_and_decor() {
        let (mut w, stone, water) = world();
        let p = Position::new(1, 1, 1);
        w.put(p, Layer::Base, stone);
        w.put_aux(p, vec![water], vec![1, 2, 3]);
        w.put_decor(p, AttachmentId::new(0, 2), stone);

        let map = scan(
            &w,
            Position::new(0, 0, 0),
            Position::new(2, 2, 2),
            ScanOptions::default(),
        );
        assert!(map.aux.contains_key(&p));
        assert!(map.payload_materials.contains(&water));
        assert_eq!(map.decor[&p].len(), 1);
        assert!(map.aux.keys().all(|k| map.base.contains_key(k)));
        assert!(map.decor.keys().all(|k| map.base.contains_key(k)));
    }

    #[test]
    fn test_free_objects_only_when_requested() {
        let (mut w, _, _) = world();
        w.put_free_object(FreeObject {
            class: "itemframe".into(),
            position: [1.5, 1.0, 1.5],
            data: vec![7],
        });
        let (a, b) = (Position::new(0, 0, 0), Position::new(2, 2, 2));

        assert!(scan(&w, a, b, ScanOptions::default()).free_objects.is_empty());
        let with = scan(
            &w,
            a,
            b,
            ScanOptions {
                include_free_objects: true,
            },
        );
        assert_eq!(with.free_objects.len(), 1);
    }
}
