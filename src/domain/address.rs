/// Addressing primitives: flat cell addresses, grid geometry, directions.

/// Default floor geometry.
pub const FLOOR_ROWS: usize = 16;
pub const FLOOR_COLUMNS: usize = 20;

/// Index into the flat, floor-major / row-major cell sequence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Address(pub usize);

/// Directional input (one step on the current floor).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    #[cfg(test)]
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];
}

/// Vertical travel between floors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FloorDirection {
    Up,
    Down,
}

/// Floors × rows × columns. Every floor has the same shape.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Geometry {
    pub floors: usize,
    pub rows: usize,
    pub columns: usize,
}

impl Geometry {
    pub fn new(floors: usize, rows: usize, columns: usize) -> Self {
        Geometry { floors, rows, columns }
    }

    /// Standard geometry with `floors` floors.
    #[allow(dead_code)]
    pub fn standard(floors: usize) -> Self {
        Geometry::new(floors, FLOOR_ROWS, FLOOR_COLUMNS)
    }

    #[inline]
    pub fn cells_per_floor(&self) -> usize {
        self.rows * self.columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.floors * self.cells_per_floor()
    }

    pub fn contains(&self, floor: usize, row: usize, column: usize) -> bool {
        floor < self.floors && row < self.rows && column < self.columns
    }

    /// Address of (floor, row, column). Caller guarantees bounds.
    #[inline]
    pub fn address(&self, floor: usize, row: usize, column: usize) -> Address {
        Address(floor * self.cells_per_floor() + row * self.columns + column)
    }

    /// (floor, row, column) of an address.
    #[inline]
    pub fn locate(&self, addr: Address) -> (usize, usize, usize) {
        let per_floor = self.cells_per_floor();
        let floor = addr.0 / per_floor;
        let local = addr.0 % per_floor;
        (floor, local / self.columns, local % self.columns)
    }

    /// One step in `dir`, staying on the same floor.
    /// Maps to address deltas of -columns, +columns, -1, +1.
    pub fn step(&self, addr: Address, dir: Direction) -> Option<Address> {
        if addr.0 >= self.len() {
            return None;
        }
        let (_, row, column) = self.locate(addr);
        match dir {
            Direction::Up if row > 0 => Some(Address(addr.0 - self.columns)),
            Direction::Down if row + 1 < self.rows => Some(Address(addr.0 + self.columns)),
            Direction::Left if column > 0 => Some(Address(addr.0 - 1)),
            Direction::Right if column + 1 < self.columns => Some(Address(addr.0 + 1)),
            _ => None,
        }
    }

    /// Same row/column on `floor`.
    pub fn on_floor(&self, addr: Address, floor: usize) -> Option<Address> {
        if addr.0 >= self.len() || floor >= self.floors {
            return None;
        }
        let (_, row, column) = self.locate(addr);
        Some(self.address(floor, row, column))
    }
}
