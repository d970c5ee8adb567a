use std::ops::{Add, Sub};

/// A 2D integer coordinate, `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dims(pub i32, pub i32);

/// A 3D integer coordinate, `(x, y, z)`, used to address a cell in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dims3D(pub i32, pub i32, pub i32);

impl Dims3D {
    pub const ZERO: Dims3D = Dims3D(0, 0, 0);

    pub fn iter_fill(from: Dims3D, to: Dims3D) -> impl Iterator<Item = Dims3D> {
        (from.2..to.2).flat_map(move |z| {
            (from.1..to.1).flat_map(move |y| (from.0..to.0).map(move |x| Dims3D(x, y, z)))
        })
    }

    pub fn all_non_negative(self) -> bool {
        self.0 >= 0 && self.1 >= 0 && self.2 >= 0
    }
}

impl Add for Dims3D {
    type Output = Dims3D;

    fn add(self, other: Dims3D) -> Dims3D {
        Dims3D(self.0 + other.0, self.1 + other.1, self.2 + other.2)
    }
}

impl Sub for Dims3D {
    type Output = Dims3D;

    fn sub(self, other: Dims3D) -> Dims3D {
        Dims3D(self.0 - other.0, self.1 - other.1, self.2 - other.2)
    }
}

impl From<(i32, i32, i32)> for Dims3D {
    fn from(t: (i32, i32, i32)) -> Self {
        Dims3D(t.0, t.1, t.2)
    }
}

impl Add for Dims {
    type Output = Dims;

    fn add(self, other: Dims) -> Dims {
        Dims(self.0 + other.0, self.1 + other.1)
    }
}
