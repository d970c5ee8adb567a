//! Per-layer Wave Function Collapse solver (§4.3-4.6).
//!
//! Each layer is solved independently by [`solve_layer`], which owns the whole
//! collapse/propagate/reseed loop and returns the layer fully collapsed (every non-void
//! cell at popcount 1). Edge sealing, fixup, region identification and welding happen
//! afterward in [`crate::seal`], [`crate::region`] and [`crate::welder`].

use rand::RngCore;

use crate::cell::Cell;
use crate::heap::EntropyHeap;
use crate::instrument::span;
use crate::rng::Lcg32;
use crate::tile::{self, Category, NUM_CATEGORIES, Side, TileVariant};

const GAUSS_WIDTH: f32 = 2.0;
const CONNECTOR_BOOST: f32 = 2.5;
const TILE_POSITIONS: [f32; NUM_CATEGORIES] = [0.0, 1.0, 2.0, 3.0, 4.0, 0.0];
const MASK_MODE_RATES: [f32; NUM_CATEGORIES] = [0.05, 0.20, 0.40, 0.30, 0.05, 0.0];

/// A single layer under construction: row-major `(y, x)`, `width * length` cells.
pub struct Layer {
    pub width: u32,
    pub length: u32,
    cells: Vec<Cell>,
}

impl Layer {
    pub fn new(width: u32, length: u32) -> Self {
        Self {
            width,
            length,
            cells: vec![Cell::VOID; (width * length) as usize],
        }
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Cell {
        self.cells[self.idx(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: Cell) {
        let i = self.idx(x, y);
        self.cells[i] = value;
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    fn neighbor(&self, x: u32, y: u32, side: Side) -> Option<(u32, u32)> {
        let (dx, dy) = side.offset();
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.length as i64 {
            return None;
        }
        Some((nx as u32, ny as u32))
    }
}

fn gaussian_rates(current_collapsed: u32, target_collapsed: u32) -> [f32; NUM_CATEGORIES] {
    let progress = if target_collapsed > 0 {
        (current_collapsed as f32 / target_collapsed as f32).min(1.0)
    } else {
        0.0
    };

    let peak = TILE_POSITIONS[Category::D as usize] * progress;
    let mut raw = [0.0f32; NUM_CATEGORIES];

    for (i, raw) in raw.iter_mut().enumerate() {
        if i == Category::SpecialX as usize {
            continue;
        }
        let d = TILE_POSITIONS[i] - peak;
        *raw = (-(d * d) / (2.0 * GAUSS_WIDTH * GAUSS_WIDTH)).exp();
    }

    let boost = CONNECTOR_BOOST * (1.0 - progress);
    raw[Category::L as usize] += boost;
    raw[Category::I as usize] += boost;

    let total: f32 = raw.iter().sum();
    if total > 0.0 {
        for r in raw.iter_mut() {
            *r /= total;
        }
    }
    raw
}

/// Mask to AND into the neighbor on `side` given whether the current tile opens toward it.
fn propagation_mask(side: Side, current_opens: bool) -> u16 {
    if current_opens {
        tile::open_mask(side.opposite())
    } else {
        tile::closed_mask(side.opposite())
    }
}

/// Collapses a superposed cell to one variant, weighted by category (§4.5).
fn collapse_tile(cell: Cell, rates: &[f32; NUM_CATEGORIES], rng: &mut Lcg32) -> Cell {
    if cell.0 == 0 {
        return cell;
    }

    let total = tile::weighted_total(cell.0, rates);

    if total <= 0.0001 {
        let pop = cell.popcount();
        if pop == 0 {
            return cell;
        }
        let which = rng.next_u32() % pop;
        let mut seen = 0;
        for bit in 0..16u8 {
            if cell.0 & (1 << bit) != 0 {
                if seen == which {
                    return Cell(1 << bit);
                }
                seen += 1;
            }
        }
        return cell;
    }

    let mut draw = rng.next_f32() * total;
    for bit in 0..16u8 {
        if cell.0 & (1 << bit) == 0 {
            continue;
        }
        let variant = TileVariant::from_index(bit).expect("valid bit index");
        draw -= rates[variant.category() as usize];
        if draw <= 0.0 {
            return Cell(1 << bit);
        }
    }

    for bit in (0..16u8).rev() {
        if cell.0 & (1 << bit) != 0 {
            return Cell(1 << bit);
        }
    }
    cell
}

/// Applies `cell`'s port state at `(x, y)` to its four neighbors, reviving any that
/// collapse to a contradiction. Returns the neighbors whose value actually changed.
fn propagate(layer: &mut Layer, x: u32, y: u32) -> Vec<(u32, u32)> {
    let cell = layer.get(x, y);
    let mut changed = Vec::with_capacity(4);

    for side in Side::ALL {
        let Some((nx, ny)) = layer.neighbor(x, y, side) else {
            continue;
        };
        let neighbor = layer.get(nx, ny);
        if neighbor.popcount() <= 1 {
            continue;
        }

        let opens = if cell.is_void() {
            false
        } else {
            cell.variant().map(|v| v.is_open(side)).unwrap_or(true)
        };
        let mask = propagation_mask(side, opens);

        let mut updated = neighbor;
        updated.constrain(mask);
        if updated.0 == 0 {
            updated = Cell::ALL_POSSIBLE;
        }

        if updated != neighbor {
            layer.set(nx, ny, updated);
            changed.push((nx, ny));
        }
    }

    changed
}

fn insert_if_candidate(heap: &mut EntropyHeap, layer: &Layer, x: u32, y: u32, rng: &mut Lcg32) {
    let cell = layer.get(x, y);
    if cell.popcount() > 1 {
        heap.insert_or_update(x, y, cell.popcount(), rng);
    }
}

/// True if any collapsed neighbor has a port pointing at `(x, y)` (§4.3 void-trim).
fn is_required(layer: &Layer, x: u32, y: u32) -> bool {
    for side in Side::ALL {
        let Some((nx, ny)) = layer.neighbor(x, y, side) else {
            continue;
        };
        let neighbor = layer.get(nx, ny);
        if let Some(variant) = neighbor.variant() {
            if variant.is_open(side.opposite()) {
                return true;
            }
        }
    }
    false
}

/// Sweeps for an uncollapsed, non-void cell to reseed the heap from when it empties early
/// (§4.4). Revives contradictions in place; returns the chosen cell, if any.
fn find_seed_location(layer: &mut Layer, rng: &mut Lcg32) -> Option<(u32, u32)> {
    let mut best: Option<(u32, u32, f32)> = None;

    for y in 0..layer.length {
        for x in 0..layer.width {
            let cell = layer.get(x, y);
            if cell.is_void() {
                continue;
            }
            if cell.is_collapsed() {
                continue;
            }

            if cell.is_contradiction() {
                let mut revived = Cell::ALL_POSSIBLE;
                for side in Side::ALL {
                    match layer.neighbor(x, y, side) {
                        None => {}
                        Some((nx, ny)) => {
                            let neighbor = layer.get(nx, ny);
                            if neighbor.is_void() {
                                revived.constrain(tile::closed_mask(side));
                            } else if let Some(variant) = neighbor.variant() {
                                let mask = if variant.is_open(side.opposite()) {
                                    tile::open_mask(side)
                                } else {
                                    tile::closed_mask(side)
                                };
                                revived.constrain(mask);
                            }
                        }
                    }
                }
                if revived.0 == 0 {
                    revived = Cell::ALL_POSSIBLE;
                }
                layer.set(x, y, revived);
                return Some((x, y));
            }

            let noise = ((((y * layer.width + x) as u32) ^ rng.next_u32()) & 0xFFFF) as f32 * 0.001;
            if best.map(|(_, _, score)| noise < score).unwrap_or(true) {
                best = Some((x, y, noise));
            }
        }
    }

    best.map(|(x, y, _)| (x, y))
}

/// Runs the WFC main loop for one layer until every non-void cell is collapsed or the
/// iteration cap is hit (§4.3 step 5-6). `layer` must already hold void/AllPossible/
/// pre-collapsed stair cells from the architect.
pub fn solve_layer(layer: &mut Layer, fullness: u32, seed: u32) {
    let _span = span("solve_layer");
    let mut rng = Lcg32::new(seed);

    let target: u32 = layer
        .cells()
        .iter()
        .filter(|c| !c.is_void())
        .count() as u32;

    let mut collapsed: u32 = layer
        .cells()
        .iter()
        .filter(|c| c.is_collapsed())
        .count() as u32;

    let mask_mode = fullness < 100;
    let mut rates = if mask_mode {
        MASK_MODE_RATES
    } else {
        [1.0 / NUM_CATEGORIES as f32; NUM_CATEGORIES]
    };

    let mut heap = EntropyHeap::new(layer.width, layer.length);

    for y in 0..layer.length {
        for x in 0..layer.width {
            let cell = layer.get(x, y);
            if cell.is_void() || cell.is_collapsed() {
                propagate(layer, x, y);
            }
        }
    }
    for y in 0..layer.length {
        for x in 0..layer.width {
            insert_if_candidate(&mut heap, layer, x, y, &mut rng);
        }
    }

    let cx = layer.width / 2;
    let cy = layer.length / 2;
    if !layer.get(cx, cy).is_void() && layer.get(cx, cy).popcount() > 1 {
        layer.set(cx, cy, Cell::collapsed(TileVariant::CrossNormal));
        propagate(layer, cx, cy);
        collapsed += 1;
        for side in Side::ALL {
            if let Some((nx, ny)) = layer.neighbor(cx, cy, side) {
                insert_if_candidate(&mut heap, layer, nx, ny, &mut rng);
            }
        }
    }

    let max_iter = 50u64 * layer.width as u64 * layer.length as u64;
    let mut iter: u64 = 0;

    while collapsed < target && iter < max_iter {
        iter += 1;

        if !mask_mode && (iter % 10 == 0 || collapsed < 50) {
            rates = gaussian_rates(collapsed, target);
        }

        let popped = heap.pop();
        let (x, y) = match popped {
            Some(pos) => pos,
            None => match find_seed_location(layer, &mut rng) {
                Some((x, y)) => {
                    let cell = layer.get(x, y);
                    if cell.popcount() > 1 {
                        layer.set(x, y, Cell::collapsed(TileVariant::CrossNormal));
                        propagate(layer, x, y);
                        collapsed += 1;
                        for side in Side::ALL {
                            if let Some((nx, ny)) = layer.neighbor(x, y, side) {
                                insert_if_candidate(&mut heap, layer, nx, ny, &mut rng);
                            }
                        }
                        continue;
                    }
                    (x, y)
                }
                None => break,
            },
        };

        let cell = layer.get(x, y);
        if cell.popcount() > 1 {
            let collapsed_cell = collapse_tile(cell, &rates, &mut rng);
            layer.set(x, y, collapsed_cell);
            propagate(layer, x, y);
            if !layer.get(x, y).is_void() && layer.get(x, y).is_collapsed() {
                collapsed += 1;
            }
        }

        for side in Side::ALL {
            if let Some((nx, ny)) = layer.neighbor(x, y, side) {
                insert_if_candidate(&mut heap, layer, nx, ny, &mut rng);
            }
        }

        if !mask_mode && collapsed >= target && !is_required(layer, x, y) {
            layer.set(x, y, Cell::VOID);
            propagate(layer, x, y);
            collapsed -= 1;
        }
    }

    if iter >= max_iter {
        log::warn!(
            "layer solver hit iteration cap ({}/{} cells collapsed)",
            collapsed,
            target
        );
    }

    for cell in layer.cells_mut() {
        if cell.popcount() > 1 {
            *cell = Cell::VOID;
        }
    }
}
