//! Region identification (§4.8): compress each collapsed cell to a packed
//! `[RegionID|TileIndex]` and flood-fill region ids following open ports.

use std::collections::VecDeque;

use crate::cell::PackedCell;
use crate::solver::Layer;
use crate::tile::{Side, TileVariant};

const MAX_REGION_ID: u16 = 4095;

/// A layer after region identification: same footprint as [`Layer`] but addressed in the
/// packed `[RegionID|TileIndex]` representation.
pub struct PackedLayer {
    pub width: u32,
    pub length: u32,
    cells: Vec<PackedCell>,
}

impl PackedLayer {
    fn idx(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn get(&self, x: u32, y: u32) -> PackedCell {
        self.cells[self.idx(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: PackedCell) {
        let i = self.idx(x, y);
        self.cells[i] = value;
    }

    pub fn neighbor(&self, x: u32, y: u32, side: Side) -> Option<(u32, u32)> {
        let (dx, dy) = side.offset();
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.length as i64 {
            return None;
        }
        Some((nx as u32, ny as u32))
    }

    pub fn cells(&self) -> &[PackedCell] {
        &self.cells
    }
}

/// Compresses `layer` into tile indices (void becomes `0xFFFF`) and assigns a RegionID to
/// each connected component, following only open ports rather than plain 4-adjacency.
pub fn identify_regions(layer: &Layer) -> PackedLayer {
    let _span = crate::instrument::span("identify_regions");
    let width = layer.width;
    let length = layer.length;

    let mut packed = PackedLayer {
        width,
        length,
        cells: vec![PackedCell::VOID; (width * length) as usize],
    };

    for y in 0..length {
        for x in 0..width {
            let cell = layer.get(x, y);
            if let Some(variant) = cell.variant() {
                packed.set(x, y, PackedCell::from_tile_index(variant.index()));
            }
        }
    }

    let mut next_region: u16 = 1;

    for y in 0..length {
        for x in 0..width {
            let cell = packed.get(x, y);
            if cell.is_void() || cell.is_region_assigned() {
                continue;
            }
            if next_region > MAX_REGION_ID {
                log::warn!("region id overflow: leaving remaining cells unassigned");
                continue;
            }
            mark_region_iterative(&mut packed, next_region, x, y);
            next_region += 1;
        }
    }

    packed
}

fn mark_region_iterative(packed: &mut PackedLayer, region_id: u16, start_x: u32, start_y: u32) {
    let mut queue = VecDeque::new();
    queue.push_back((start_x, start_y));
    let start = packed.get(start_x, start_y);
    packed.set(start_x, start_y, start.with_region(region_id));

    while let Some((x, y)) = queue.pop_front() {
        let cell = packed.get(x, y);
        let Some(variant) = TileVariant::from_index(cell.tile_index()) else {
            continue;
        };

        for side in Side::ALL {
            if !variant.is_open(side) {
                continue;
            }
            let Some((nx, ny)) = packed.neighbor(x, y, side) else {
                continue;
            };
            let neighbor = packed.get(nx, ny);
            if neighbor.is_void() || neighbor.is_region_assigned() {
                continue;
            }
            packed.set(nx, ny, neighbor.with_region(region_id));
            queue.push_back((nx, ny));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn three_cell_chain_gets_one_region() {
        let mut layer = Layer::new(3, 1);
        layer.set(0, 0, Cell::collapsed(TileVariant::DeadEndE));
        layer.set(1, 0, Cell::collapsed(TileVariant::StraightWE));
        layer.set(2, 0, Cell::collapsed(TileVariant::DeadEndW));

        let packed = identify_regions(&layer);
        let r0 = packed.get(0, 0).region_id();
        let r1 = packed.get(1, 0).region_id();
        let r2 = packed.get(2, 0).region_id();

        assert_eq!(r0, r1);
        assert_eq!(r1, r2);
        assert_ne!(r0, 0);
    }

    #[test]
    fn disconnected_dead_ends_get_different_regions() {
        let mut layer = Layer::new(3, 1);
        layer.set(0, 0, Cell::collapsed(TileVariant::DeadEndN));
        layer.set(2, 0, Cell::collapsed(TileVariant::DeadEndN));

        let packed = identify_regions(&layer);
        assert_ne!(packed.get(0, 0).region_id(), packed.get(2, 0).region_id());
        assert!(packed.get(1, 0).is_void());
    }
}
