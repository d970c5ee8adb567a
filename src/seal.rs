//! Edge sealing and boundary fixup (§4.7), run after the WFC main loop leaves a layer
//! fully collapsed but possibly with stray ports facing voids or the grid boundary.

use crate::cell::Cell;
use crate::solver::Layer;
use crate::tile::{self, Side, TileVariant};

/// Fills voids with an absorbing receiver shape wherever a non-void neighbor has an open
/// port pointing at them, so no collapsed tile is left with a port facing a wall of void.
pub fn seal_edges(layer: &mut Layer) {
    let _span = crate::instrument::span("seal_edges");
    let mut updates = Vec::new();

    for y in 0..layer.length {
        for x in 0..layer.width {
            if !layer.get(x, y).is_void() {
                continue;
            }

            let mut flags = 0u8;
            for side in Side::ALL {
                let (dx, dy) = side.offset();
                let nx = x as i64 + dx as i64;
                let ny = y as i64 + dy as i64;
                if nx < 0 || ny < 0 || nx >= layer.width as i64 || ny >= layer.length as i64 {
                    continue;
                }
                let neighbor = layer.get(nx as u32, ny as u32);
                if let Some(variant) = neighbor.variant() {
                    if variant.is_open(side.opposite()) {
                        flags |= tile::side_flag(side);
                    }
                }
            }

            if flags != 0 {
                if let Some(variant) = tile::variant_from_flags(flags) {
                    updates.push((x, y, variant));
                }
            }
        }
    }

    for (x, y, variant) in updates {
        layer.set(x, y, Cell::collapsed(variant));
    }
}

/// Clears the outward-facing port on every boundary cell so the grid edge never exposes
/// a dangling corridor mouth.
pub fn fixup_edges(layer: &mut Layer) {
    let _span = crate::instrument::span("fixup_edges");
    let w = layer.width;
    let l = layer.length;

    for x in 0..w {
        clear_port(layer, x, 0, Side::North);
    }
    for x in 0..w {
        clear_port(layer, x, l - 1, Side::South);
    }
    for y in 0..l {
        clear_port(layer, 0, y, Side::West);
    }
    for y in 0..l {
        clear_port(layer, w - 1, y, Side::East);
    }
}

fn clear_port(layer: &mut Layer, x: u32, y: u32, side: Side) {
    let cell = layer.get(x, y);
    let Some(variant) = cell.variant() else {
        return;
    };
    if !variant.is_open(side) {
        return;
    }

    let flags = tile::side_flags(variant) & !tile::side_flag(side);
    match tile::variant_from_flags(flags) {
        Some(new_variant) => layer.set(x, y, Cell::collapsed(new_variant)),
        None => layer.set(x, y, Cell::VOID),
    }
}
