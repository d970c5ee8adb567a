//! Single-threaded pre-seeding pass (§2 phase 1 / §9): builds the per-layer fill mask and
//! places inter-layer stair pairs before any per-layer worker starts.

use rand::RngCore;

use crate::cell::Cell;
use crate::noise::{generate_mask, replicate_to_volume};
use crate::rng::Lcg32;
use crate::solver::Layer;
use crate::tile::TileVariant;

/// Builds every layer's starting cell state: void/AllPossible from the mask (or fully
/// AllPossible in ocean mode), plus stair pairs wired between adjacent layers.
pub fn build_layers(width: u32, length: u32, height: u32, fullness: u32, seed: u32) -> Vec<Layer> {
    let _span = crate::instrument::span("architect");
    let mut layers: Vec<Layer> = (0..height).map(|_| Layer::new(width, length)).collect();

    if fullness < 100 {
        let mask = generate_mask(width, length, fullness, seed);
        let volume = replicate_to_volume(&mask, height);
        for (layer, mask) in layers.iter_mut().zip(volume.iter()) {
            for y in 0..length {
                for x in 0..width {
                    if mask.get(x, y) {
                        layer.set(x, y, Cell::ALL_POSSIBLE);
                    }
                }
            }
        }
    } else {
        for layer in layers.iter_mut() {
            for cell in layer.cells_mut() {
                *cell = Cell::ALL_POSSIBLE;
            }
        }
    }

    place_stairs(&mut layers, width, length, height, seed);

    layers
}

fn place_stairs(layers: &mut [Layer], width: u32, length: u32, height: u32, seed: u32) {
    if height < 2 || width < 3 || length < 3 {
        return;
    }

    let mut rng = Lcg32::new(seed);
    let stairs_per_layer = ((width * length) / 400).max(2);
    let max_attempts = stairs_per_layer * 20;

    for z in 0..(height - 1) {
        let mut placed = 0u32;
        let mut attempts = 0u32;

        while placed < stairs_per_layer && attempts < max_attempts {
            attempts += 1;
            let x = 1 + rng.next_u32() % (width - 2);
            let y = 1 + rng.next_u32() % (length - 2);

            if layers[z as usize].get(x, y) != Cell::ALL_POSSIBLE {
                continue;
            }
            if z > 0 && layers[(z - 1) as usize].get(x, y) == Cell::collapsed(TileVariant::CrossSpecial) {
                continue;
            }

            layers[z as usize].set(x, y, Cell::collapsed(TileVariant::CrossSpecial));
            layers[(z + 1) as usize].set(x, y, Cell::collapsed(TileVariant::CrossNormal));
            placed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocean_mode_fills_every_cell() {
        let layers = build_layers(6, 6, 1, 100, 3);
        for cell in layers[0].cells() {
            assert_eq!(*cell, Cell::ALL_POSSIBLE);
        }
    }

    #[test]
    fn stairs_are_paired_across_layers() {
        let layers = build_layers(20, 20, 3, 100, 11);
        for z in 0..2usize {
            for y in 0..20 {
                for x in 0..20 {
                    if layers[z].get(x, y) == Cell::collapsed(TileVariant::CrossSpecial) {
                        assert_eq!(
                            layers[z + 1].get(x, y),
                            Cell::collapsed(TileVariant::CrossNormal)
                        );
                    }
                }
            }
        }
    }
}
