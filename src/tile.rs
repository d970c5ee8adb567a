//! The sixteen corridor variants and the bit-mask arithmetic used to collapse and
//! propagate them.
//!
//! Every variant is represented as a single set bit in a 16-bit word. A cell under
//! solving holds the OR of every variant still possible there; popcount gives its
//! entropy. The bit-to-tile assignment below is the wire format (see [`crate::Grid`])
//! and must not be reordered.

/// One side of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// The grid offset stepping from a cell to its neighbor on this side.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Side::North => (0, -1),
            Side::South => (0, 1),
            Side::East => (1, 0),
            Side::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
            Side::East => Side::West,
            Side::West => Side::East,
        }
    }
}

/// Spawn-rate category a tile variant belongs to: X, T, L, I, D, or the unspawnable
/// special-X stair marker. Index order matches the spawn-rate vector in §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Category {
    X = 0,
    T = 1,
    L = 2,
    I = 3,
    D = 4,
    SpecialX = 5,
}

pub const NUM_CATEGORIES: usize = 6;

/// One of the sixteen corridor variants, indexed 0..16 as in the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TileVariant {
    CornerNE = 0,
    CornerSE = 1,
    CornerSW = 2,
    CornerNW = 3,
    StraightNS = 4,
    StraightWE = 5,
    TNorth = 6,
    TEast = 7,
    TSouth = 8,
    TWest = 9,
    CrossNormal = 10,
    CrossSpecial = 11,
    DeadEndN = 12,
    DeadEndE = 13,
    DeadEndS = 14,
    DeadEndW = 15,
}

pub const TILE_COUNT: usize = 16;

/// All sixteen variants in bit order, for iteration.
pub const ALL_VARIANTS: [TileVariant; TILE_COUNT] = [
    TileVariant::CornerNE,
    TileVariant::CornerSE,
    TileVariant::CornerSW,
    TileVariant::CornerNW,
    TileVariant::StraightNS,
    TileVariant::StraightWE,
    TileVariant::TNorth,
    TileVariant::TEast,
    TileVariant::TSouth,
    TileVariant::TWest,
    TileVariant::CrossNormal,
    TileVariant::CrossSpecial,
    TileVariant::DeadEndN,
    TileVariant::DeadEndE,
    TileVariant::DeadEndS,
    TileVariant::DeadEndW,
];

/// The fixed bit-to-category lookup used by weighted collapse (§4.5).
const BIT_TO_CATEGORY: [Category; TILE_COUNT] = [
    Category::L,
    Category::L,
    Category::L,
    Category::L,
    Category::I,
    Category::I,
    Category::T,
    Category::T,
    Category::T,
    Category::T,
    Category::X,
    Category::SpecialX,
    Category::D,
    Category::D,
    Category::D,
    Category::D,
];

impl TileVariant {
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<TileVariant> {
        ALL_VARIANTS.get(index as usize).copied()
    }

    /// The single-bit mask naming this variant.
    pub fn mask(self) -> u16 {
        1u16 << self.index()
    }

    pub fn category(self) -> Category {
        BIT_TO_CATEGORY[self.index() as usize]
    }

    /// The sides this variant has a passage on.
    pub fn open_sides(self) -> &'static [Side] {
        use Side::*;
        use TileVariant::*;
        match self {
            CornerNE => &[North, East],
            CornerSE => &[South, East],
            CornerSW => &[South, West],
            CornerNW => &[North, West],
            StraightNS => &[North, South],
            StraightWE => &[West, East],
            TNorth => &[North, East, West],
            TEast => &[North, East, South],
            TSouth => &[East, South, West],
            TWest => &[North, South, West],
            CrossNormal | CrossSpecial => &[North, East, South, West],
            DeadEndN => &[North],
            DeadEndE => &[East],
            DeadEndS => &[South],
            DeadEndW => &[West],
        }
    }

    pub fn is_open(self, side: Side) -> bool {
        self.open_sides().contains(&side)
    }
}

/// All sixteen variants, OR-ed together: the initial superposition of an uncollapsed cell.
pub const ALL_POSSIBLE: u16 = 0xFFFF;

fn bit_to_category(bit: u8) -> Category {
    BIT_TO_CATEGORY[bit as usize]
}

/// The bitwise-OR of every variant with an open port on `side`: "open mask for direction D".
pub fn open_mask(side: Side) -> u16 {
    let mut mask = 0u16;
    for v in ALL_VARIANTS {
        if v.is_open(side) {
            mask |= v.mask();
        }
    }
    mask
}

/// The complement of [`open_mask`]: every variant *without* an open port on `side`.
pub fn closed_mask(side: Side) -> u16 {
    !open_mask(side) & ALL_POSSIBLE
}

/// Maps a set of open-side flags (bitwise-ORed [`Side`] bits, §4.7) back to the single variant
/// with exactly that port set, or `None` if no such variant exists (zero or one inconsistent
/// combination of flags).
pub fn variant_from_flags(flags: u8) -> Option<TileVariant> {
    ALL_VARIANTS
        .into_iter()
        .find(|v| side_flags(*v) == flags)
}

/// The open-side flag byte for a variant: bit 0 = N, 1 = E, 2 = S, 3 = W.
pub fn side_flags(variant: TileVariant) -> u8 {
    variant
        .open_sides()
        .iter()
        .fold(0u8, |acc, side| acc | side_flag(*side))
}

pub fn side_flag(side: Side) -> u8 {
    match side {
        Side::North => 0b0001,
        Side::East => 0b0010,
        Side::South => 0b0100,
        Side::West => 0b1000,
    }
}

/// Sum of the category weight of each set bit in `possibilities` under the given spawn-rate
/// vector (indexed by [`Category`]).
pub fn weighted_total(possibilities: u16, rates: &[f32; NUM_CATEGORIES]) -> f32 {
    (0..TILE_COUNT as u8)
        .filter(|bit| possibilities & (1 << bit) != 0)
        .map(|bit| rates[bit_to_category(bit) as usize])
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_closed_masks_are_complementary() {
        for side in Side::ALL {
            assert_eq!(open_mask(side) | closed_mask(side), ALL_POSSIBLE);
            assert_eq!(open_mask(side) & closed_mask(side), 0);
        }
    }

    #[test]
    fn round_trip_mask_index_flags() {
        for v in ALL_VARIANTS {
            let mask = v.mask();
            let index = mask.trailing_zeros() as u8;
            assert_eq!(TileVariant::from_index(index), Some(v));

            let flags = side_flags(v);
            assert_eq!(variant_from_flags(flags), Some(v));
        }
    }

    #[test]
    fn cross_normal_and_special_share_ports() {
        assert_eq!(
            TileVariant::CrossNormal.open_sides(),
            TileVariant::CrossSpecial.open_sides()
        );
    }
}
