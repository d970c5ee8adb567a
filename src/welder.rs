//! Kruskal-style region welder (§4.9): carves exactly one wall per merged region pair
//! until the region-adjacency graph becomes a spanning tree.

use rand::RngCore;

use crate::region::PackedLayer;
use crate::rng::Lcg32;
use crate::tile::{self, Side, TileVariant};

struct UnionFind {
    parent: Vec<u16>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..=size as u16).collect(),
        }
    }

    fn find(&mut self, i: u16) -> u16 {
        if self.parent[i as usize] == i {
            return i;
        }
        let root = self.find(self.parent[i as usize]);
        self.parent[i as usize] = root;
        root
    }

    fn union(&mut self, a: u16, b: u16) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra as usize] = rb;
        }
    }
}

struct Bridge {
    region_a: u16,
    region_b: u16,
    x: u32,
    y: u32,
    dir: Side,
}

/// Opens the `dir` port on the cell at `(x, y)`, re-deriving its tile index from the
/// updated flag set.
fn open_wall(packed: &mut PackedLayer, x: u32, y: u32, dir: Side) {
    let cell = packed.get(x, y);
    if cell.is_void() {
        return;
    }

    let Some(variant) = TileVariant::from_index(cell.tile_index()) else {
        return;
    };
    let flags = tile::side_flags(variant) | tile::side_flag(dir);
    if let Some(new_variant) = tile::variant_from_flags(flags) {
        packed.set(x, y, cell.with_tile_index(new_variant.index()));
    }
}

/// Merges every region into one connected component by carving one wall per region pair
/// on a randomly shuffled spanning tree over inter-region bridges.
pub fn weld(packed: &mut PackedLayer, seed: u32) {
    let _span = crate::instrument::span("weld_regions");

    let max_region_id = packed
        .cells()
        .iter()
        .filter(|c| !c.is_void())
        .map(|c| c.region_id())
        .max()
        .unwrap_or(0);

    if max_region_id <= 1 {
        return;
    }

    let mut bridges = Vec::new();
    for y in 0..packed.length {
        for x in 0..packed.width {
            let cell = packed.get(x, y);
            if cell.is_void() {
                continue;
            }
            let region_a = cell.region_id();

            for dir in [Side::East, Side::South] {
                let Some((nx, ny)) = packed.neighbor(x, y, dir) else {
                    continue;
                };
                let neighbor = packed.get(nx, ny);
                if neighbor.is_void() {
                    continue;
                }
                let region_b = neighbor.region_id();
                if region_a != region_b {
                    bridges.push(Bridge {
                        region_a,
                        region_b,
                        x,
                        y,
                        dir,
                    });
                }
            }
        }
    }

    if bridges.is_empty() {
        return;
    }

    let mut rng = Lcg32::new(seed);
    let count = bridges.len();
    for i in 0..count {
        let swap_idx = (rng.next_u32() as usize) % count;
        bridges.swap(i, swap_idx);
    }

    let mut uf = UnionFind::new(max_region_id as usize);

    for bridge in &bridges {
        if uf.find(bridge.region_a) != uf.find(bridge.region_b) {
            uf.union(bridge.region_a, bridge.region_b);

            open_wall(packed, bridge.x, bridge.y, bridge.dir);

            let (nx, ny) = packed
                .neighbor(bridge.x, bridge.y, bridge.dir)
                .expect("bridge neighbor exists by construction");
            open_wall(packed, nx, ny, bridge.dir.opposite());
        }
    }

    for y in 0..packed.length {
        for x in 0..packed.width {
            let cell = packed.get(x, y);
            if cell.is_void() {
                continue;
            }
            let root = uf.find(cell.region_id());
            if root != cell.region_id() {
                packed.set(x, y, cell.with_region(root));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::region::identify_regions;
    use crate::solver::Layer;

    #[test]
    fn welds_two_adjacent_but_disconnected_regions() {
        // Neither tile opens toward the other, so they start as separate regions despite
        // being adjacent (the flood follows ports, not plain 4-adjacency).
        let mut layer = Layer::new(2, 1);
        layer.set(0, 0, Cell::collapsed(TileVariant::DeadEndN));
        layer.set(1, 0, Cell::collapsed(TileVariant::DeadEndN));

        let mut packed = identify_regions(&layer);
        assert_ne!(packed.get(0, 0).region_id(), packed.get(1, 0).region_id());

        weld(&mut packed, 0);

        assert_eq!(packed.get(0, 0).region_id(), packed.get(1, 0).region_id());
        let left = TileVariant::from_index(packed.get(0, 0).tile_index()).unwrap();
        let right = TileVariant::from_index(packed.get(1, 0).tile_index()).unwrap();
        assert!(left.is_open(Side::East));
        assert!(right.is_open(Side::West));
    }
}
