//! Converts a [`SparseVoxelMap`] into a relocatable [`PackedSchematic`].

use std::collections::BTreeMap;

use strata_voxel::{FreeObject, Layer, MaterialCode, MaterialId, MaterialRegistry, Position};

use crate::error::{Axis, PackError};
use crate::index::{AXIS_LIMIT, PackedIndex};
use crate::schematic::{PackedCell, PackedDecor, PackedSchematic, encode_free_object};
use crate::sparse::SparseVoxelMap;

/// Packs `map` relative to its minimal corner.
///
/// `requested_origin` is where the caller considers the capture to start;
/// the difference to the minimal corner is kept as `packed_offset`.
/// `registry` supplies codes for the capturing world's material IDs.
///
/// # Errors
///
/// [`PackError::SizeExceeded`] if any axis spans 1024 or more cells, checked
/// before any output is built.
pub fn pack(
    map: SparseVoxelMap,
    requested_origin: Position,
    registry: &MaterialRegistry,
) -> Result<PackedSchematic, PackError> {
    let positions = map.positions();
    let Some(first) = positions.first().copied() else {
        return Err(PackError::EmptyRegion);
    };

    let (min, max) = positions
        .iter()
        .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));

    let extent = |lo: i32, hi: i32| hi.abs_diff(lo).saturating_add(1);
    let size = (
        extent(min.x, max.x),
        extent(min.y, max.y),
        extent(min.z, max.z),
    );
    for (axis, cells) in [(Axis::X, size.0), (Axis::Y, size.1), (Axis::Z, size.2)] {
        if cells >= AXIS_LIMIT {
            tracing::warn!(
                "refusing to pack: {} cells along {}, the format stops at {}",
                cells,
                axis,
                AXIS_LIMIT - 1
            );
            return Err(PackError::SizeExceeded {
                axis,
                extent: cells,
            });
        }
    }

    let mut palette = Palette::new(registry);
    let mut cells = Vec::new();
    let mut decor = Vec::new();
    let mut aux_payloads = BTreeMap::new();

    for pos in &positions {
        let index = relative_index(*pos, min)?;
        let base = map.base.get(pos).copied().unwrap_or(MaterialId::AIR);
        let fluid = map.fluid.get(pos).copied().unwrap_or(MaterialId::AIR);
        palette.register(base)?;
        palette.register(fluid)?;

        if !base.is_air() {
            cells.push(PackedCell {
                index,
                layer: Layer::Base,
                material: base,
            });
        }
        if !fluid.is_air() {
            cells.push(PackedCell {
                index,
                layer: Layer::Fluid,
                material: fluid,
            });
        }

        if let Some(set) = map.decor.get(pos) {
            for (slot, material) in set {
                palette.register(*material)?;
                decor.push(PackedDecor {
                    index,
                    slot: *slot,
                    material: *material,
                });
            }
        }
    }

    let mut aux_sources: Vec<_> = map.aux.into_iter().collect();
    aux_sources.sort_by_key(|(p, _)| (p.y, p.z, p.x));
    for (pos, payload) in aux_sources {
        aux_payloads.insert(relative_index(pos, min)?, payload);
    }
    for material in &map.payload_materials {
        palette.register(*material)?;
    }

    let mut free_objects = Vec::with_capacity(map.free_objects.len());
    for object in &map.free_objects {
        let relative = FreeObject {
            class: object.class.clone(),
            position: [
                object.position[0] - min.x as f64,
                object.position[1] - min.y as f64,
                object.position[2] - min.z as f64,
            ],
            data: object.data.clone(),
        };
        free_objects.push(encode_free_object(&relative)?);
    }

    let schematic = PackedSchematic {
        size,
        palette: palette.into_entries(),
        cells,
        decor,
        aux_payloads,
        free_objects,
        packed_offset: min - requested_origin,
    };

    tracing::debug!(
        "packed {:?} at offset {:?}: {} cells, {} decor, {} payloads, {} palette entries",
        schematic.size,
        schematic.packed_offset,
        schematic.cells.len(),
        schematic.decor.len(),
        schematic.aux_payloads.len(),
        schematic.palette.len()
    );
    Ok(schematic)
}

/// Packs `pos - min`, naming the first axis whose offset does not fit.
fn relative_index(pos: Position, min: Position) -> Result<PackedIndex, PackError> {
    let offset = pos - min;
    PackedIndex::from_offset(offset).ok_or_else(|| {
        let (axis, delta) = [(Axis::X, offset.dx), (Axis::Y, offset.dy), (Axis::Z, offset.dz)]
            .into_iter()
            .find(|(_, d)| !(0..AXIS_LIMIT as i32).contains(d))
            .unwrap_or((Axis::X, offset.dx));
        PackError::SizeExceeded {
            axis,
            extent: delta.unsigned_abs().saturating_add(1),
        }
    })
}

/// Lazily filled ID → code table.
struct Palette<'a> {
    registry: &'a MaterialRegistry,
    entries: BTreeMap<MaterialId, MaterialCode>,
}

impl<'a> Palette<'a> {
    fn new(registry: &'a MaterialRegistry) -> Self {
        Self {
            registry,
            entries: BTreeMap::new(),
        }
    }

    fn register(&mut self, material: MaterialId) -> Result<(), PackError> {
        if self.entries.contains_key(&material) {
            return Ok(());
        }
        let code = self
            .registry
            .code(material)
            .ok_or(PackError::UnknownMaterial(material))?;
        self.entries.insert(material, code.clone());
        Ok(())
    }

    fn into_entries(self) -> BTreeMap<MaterialId, MaterialCode> {
        self.entries
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strata_voxel::{AttachmentId, DecorSet, MaterialDef, Offset};

    fn registry() -> (MaterialRegistry, MaterialId, MaterialId) {
        let mut registry = MaterialRegistry::new();
        let stone = registry
            .register(MaterialDef::solid(MaterialCode::parse("stone").unwrap()))
            .unwrap();
        let water = registry
            .register(MaterialDef::fluid(MaterialCode::parse("water").unwrap()))
            .unwrap();
        (registry, stone, water)
    }

    fn air_cell(map: &mut SparseVoxelMap, p: Position) {
        map.base.insert(p, MaterialId::AIR);
        map.fluid.insert(p, MaterialId::AIR);
    }

    #[test]
    fn test_extent_1023_packs() {
        let (registry, stone, _) = registry();
        let mut map = SparseVoxelMap::new();
        map.base.insert(Position::new(0, 0, 0), stone);
        map.base.insert(Position::new(1022, 0, 0), stone);
        let s = pack(map, Position::new(0, 0, 0), &registry).unwrap();
        assert_eq!(s.size, (1023, 1, 1));
    }

    #[test]
    fn test_extent_1024_fails_on_every_axis() {
        let (registry, stone, _) = registry();
        for far in [
            Position::new(1023, 0, 0),
            Position::new(0, 1023, 0),
            Position::new(0, 0, 1023),
        ] {
            let mut map = SparseVoxelMap::new();
            map.base.insert(Position::new(0, 0, 0), stone);
            map.base.insert(far, stone);
            let result = pack(map, Position::new(0, 0, 0), &registry);
            assert!(
                matches!(result, Err(PackError::SizeExceeded { extent: 1024, .. })),
                "expected SizeExceeded for {far:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_relative_index_names_offending_axis() {
        let min = Position::new(0, 0, 0);
        let result = relative_index(Position::new(5, 2000, 7), min);
        assert!(matches!(
            result,
            Err(PackError::SizeExceeded {
                axis: Axis::Y,
                extent: 2001
            })
        ));
        let result = relative_index(Position::new(0, 0, 1024), min);
        assert!(matches!(
            result,
            Err(PackError::SizeExceeded {
                axis: Axis::Z,
                extent: 1025
            })
        ));
    }

    #[test]
    fn test_span_across_whole_i32_range_is_rejected() {
        let (registry, stone, _) = registry();
        let mut map = SparseVoxelMap::new();
        map.base.insert(Position::new(i32::MIN, 0, 0), stone);
        map.base.insert(Position::new(i32::MAX, 0, 0), stone);
        assert!(matches!(
            pack(map, Position::new(0, 0, 0), &registry),
            Err(PackError::SizeExceeded {
                axis: Axis::X,
                extent: u32::MAX
            })
        ));
    }

    #[test]
    fn test_air_cells_extend_bounding_box() {
        let (registry, stone, _) = registry();
        let mut map = SparseVoxelMap::new();
        for p in strata_voxel::BlockBox::new(Position::new(0, 0, 0), Position::new(4, 4, 4))
            .positions()
        {
            air_cell(&mut map, p);
        }
        map.base.insert(Position::new(0, 0, 0), stone);
        map.base.insert(Position::new(4, 4, 4), stone);
        air_cell(&mut map, Position::new(2, 2, 2));

        let s = pack(map, Position::new(0, 0, 0), &registry).unwrap();
        assert_eq!(s.size, (5, 5, 5));
        assert_eq!(s.cells.len(), 2);
        assert!(s.palette.contains_key(&MaterialId::AIR));
    }

    #[test]
    fn test_dual_layer_cell_emits_two_entries() {
        let (registry, stone, water) = registry();
        let mut map = SparseVoxelMap::new();
        let p = Position::new(3, 3, 3);
        map.base.insert(p, stone);
        map.fluid.insert(p, water);

        let s = pack(map, p, &registry).unwrap();
        assert_eq!(s.cells.len(), 2);
        assert_eq!(s.cells[0].index, s.cells[1].index);
        assert_eq!(s.cells[0].material, stone);
        assert_eq!(s.cells[1].material, water);
    }

    #[test]
    fn test_packed_offset_is_min_minus_origin() {
        let (registry, stone, _) = registry();
        let mut map = SparseVoxelMap::new();
        map.base.insert(Position::new(12, 70, -4), stone);
        let s = pack(map, Position::new(10, 64, -8), &registry).unwrap();
        assert_eq!(s.packed_offset, Offset::new(2, 6, 4));
        assert_eq!(s.cells[0].index, PackedIndex(0));
    }

    #[test]
    fn test_decor_payload_and_free_objects_are_relative() {
        let (registry, stone, water) = registry();
        let mut map = SparseVoxelMap::new();
        let min = Position::new(100, 50, 100);
        let p = min.add_xyz(1, 2, 3);
        air_cell(&mut map, min);
        map.base.insert(p, stone);
        let mut set = DecorSet::new();
        set.insert(AttachmentId(4), stone);
        map.decor.insert(p, set);
        map.aux.insert(p, vec![1, 2]);
        map.payload_materials.insert(water);
        map.free_objects.push(FreeObject {
            class: "item".into(),
            position: [101.5, 50.0, 100.5],
            data: vec![],
        });

        let s = pack(map, min, &registry).unwrap();
        let expected = PackedIndex::encode(1, 2, 3).unwrap();
        assert_eq!(s.decor[0].index, expected);
        assert_eq!(s.aux_payloads[&expected], vec![1, 2]);
        assert!(s.palette.contains_key(&water));
        let object = crate::schematic::decode_free_object(&s.free_objects[0]).unwrap();
        assert_eq!(object.position, [1.5, 0.0, 0.5]);
    }

    #[test]
    fn test_unknown_material_rejected() {
        let (registry, _, _) = registry();
        let mut map = SparseVoxelMap::new();
        map.base.insert(Position::new(0, 0, 0), MaterialId(99));
        assert!(matches!(
            pack(map, Position::new(0, 0, 0), &registry),
            Err(PackError::UnknownMaterial(MaterialId(99)))
        ));
    }

    #[test]
    fn test_empty_map_rejected() {
        let (registry, _, _) = registry();
        assert!(matches!(
            pack(SparseVoxelMap::new(), Position::new(0, 0, 0), &registry),
            Err(PackError::EmptyRegion)
        ));
    }
}
