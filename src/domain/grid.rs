/// Level: the multi-floor cell grid.
///
/// ## Layout
///
/// Cells live in one flat `Vec`, floor-major then row-major:
///   `address = floor * rows * columns + row * columns + column`
///
/// The flat character list produced by `to_characters()` uses exactly the
/// same order, one legend character per cell, so it is the boundary format
/// exchanged with whatever stores levels on disk.
///
/// ## Derived aggregates (fixed at load)
///
///   - `total_stars`          : Star cells present when the grid was built
///   - `last_playable_floor`  : highest floor holding anything but Wall/Empty
///
/// ## Board transforms
///
/// Transforms permute the cells of one floor. A cell's kind and visibility
/// move to the destination position; the player travels with the cell it
/// stands on.

use thiserror::Error;

use super::address::{Address, Direction, Geometry};
use super::cell::{Cell, CellKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({floor}, {row}, {column}) is outside the grid")]
    OutOfRange { floor: usize, row: usize, column: usize },
}

/// Why a character list was rejected. Nothing is partially loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelLoadError {
    #[error("grid needs at least one floor, row and column")]
    EmptyGeometry,
    #[error("expected {expected} cells, found {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("unknown cell character {ch:?} at index {index}")]
    UnknownCell { index: usize, ch: char },
    #[error("level has no departure cell")]
    MissingDeparture,
    #[error("level has {0} departure cells, expected exactly one")]
    MultipleDepartures(usize),
    #[error("level has no arrival cell")]
    MissingArrival,
    #[error("level has {0} arrival cells, expected exactly one")]
    MultipleArrivals(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    geometry: Geometry,
    cells: Vec<Cell>,
    player: Address,
    total_stars: u32,
    last_playable_floor: usize,
}

// ── Construction / serialization ──

impl Level {
    /// Rebuild a grid from its flat character list.
    pub fn from_characters(geometry: Geometry, chars: &[char]) -> Result<Level, LevelLoadError> {
        if geometry.floors == 0 || geometry.rows == 0 || geometry.columns == 0 {
            return Err(LevelLoadError::EmptyGeometry);
        }
        if chars.len() != geometry.len() {
            return Err(LevelLoadError::WrongLength { expected: geometry.len(), actual: chars.len() });
        }

        let mut cells = Vec::with_capacity(chars.len());
        for (index, &ch) in chars.iter().enumerate() {
            let kind = CellKind::from_char(ch).ok_or(LevelLoadError::UnknownCell { index, ch })?;
            let (floor, row, column) = geometry.locate(Address(index));
            cells.push(Cell::new(kind, floor, row, column));
        }

        let departures: Vec<usize> = positions_of(&cells, CellKind::Departure);
        let arrivals = positions_of(&cells, CellKind::Arrival).len();
        match departures.len() {
            0 => return Err(LevelLoadError::MissingDeparture),
            1 => {}
            n => return Err(LevelLoadError::MultipleDepartures(n)),
        }
        match arrivals {
            0 => return Err(LevelLoadError::MissingArrival),
            1 => {}
            n => return Err(LevelLoadError::MultipleArrivals(n)),
        }

        let total_stars = cells.iter().filter(|c| c.kind == CellKind::Star).count() as u32;
        let last_playable_floor = cells.iter()
            .filter(|c| c.kind.is_content())
            .map(|c| c.floor)
            .max()
            .unwrap_or(0);

        Ok(Level {
            geometry,
            cells,
            player: Address(departures[0]),
            total_stars,
            last_playable_floor,
        })
    }

    /// Flat character list, floor-major / row-major.
    pub fn to_characters(&self) -> Vec<char> {
        self.cells.iter().map(|c| c.kind.to_char()).collect()
    }
}

fn positions_of(cells: &[Cell], kind: CellKind) -> Vec<usize> {
    cells.iter().enumerate().filter(|(_, c)| c.kind == kind).map(|(i, _)| i).collect()
}

// ── Queries ──

impl Level {
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells of one floor (empty slice past the last floor).
    #[allow(dead_code)]
    pub fn floor_cells(&self, floor: usize) -> &[Cell] {
        if floor >= self.geometry.floors {
            return &[];
        }
        let per_floor = self.geometry.cells_per_floor();
        &self.cells[floor * per_floor..(floor + 1) * per_floor]
    }

    /// Coordinate lookup for the level editor, which addresses cells by
    /// floor, row and column rather than by flat index.
    #[allow(dead_code)]
    pub fn cell_at(&self, floor: usize, row: usize, column: usize) -> Result<&Cell, GridError> {
        if !self.geometry.contains(floor, row, column) {
            return Err(GridError::OutOfRange { floor, row, column });
        }
        Ok(&self.cells[self.geometry.address(floor, row, column).0])
    }

    pub fn cell(&self, addr: Address) -> Option<&Cell> {
        self.cells.get(addr.0)
    }

    /// Kind at `addr`. Out of range reads as Wall.
    #[inline]
    pub fn kind_at(&self, addr: Address) -> CellKind {
        self.cells.get(addr.0).map_or(CellKind::Wall, |c| c.kind)
    }

    pub fn neighbor(&self, addr: Address, dir: Direction) -> Option<Address> {
        self.geometry.step(addr, dir)
    }

    /// Same row and column one floor up.
    pub fn floor_above(&self, addr: Address) -> Option<Address> {
        let (floor, _, _) = self.geometry.locate(addr);
        self.geometry.on_floor(addr, floor + 1)
    }

    pub fn floor_below(&self, addr: Address) -> Option<Address> {
        let (floor, _, _) = self.geometry.locate(addr);
        floor.checked_sub(1).and_then(|f| self.geometry.on_floor(addr, f))
    }

    pub fn floor_of(&self, addr: Address) -> usize {
        self.geometry.locate(addr).0
    }

    pub fn player(&self) -> Address {
        self.player
    }

    pub fn player_floor(&self) -> usize {
        self.floor_of(self.player)
    }

    /// Current address of the (unique) departure cell.
    pub fn departure(&self) -> Address {
        self.find(CellKind::Departure).unwrap_or(self.player)
    }

    pub fn find(&self, kind: CellKind) -> Option<Address> {
        self.cells.iter().position(|c| c.kind == kind).map(Address)
    }

    pub fn total_stars(&self) -> u32 {
        self.total_stars
    }

    pub fn last_playable_floor(&self) -> usize {
        self.last_playable_floor
    }
}

// ── Mutation ──

impl Level {
    /// Reset a vacated cell to Empty. Protected kinds are kept.
    /// Returns true if the cell changed.
    pub fn empty(&mut self, addr: Address) -> bool {
        match self.cells.get_mut(addr.0) {
            Some(cell) if !cell.kind.is_protected() && cell.kind != CellKind::Empty => {
                cell.kind = CellKind::Empty;
                true
            }
            _ => false,
        }
    }

    pub fn set_player(&mut self, addr: Address) {
        if addr.0 < self.cells.len() {
            self.player = addr;
        }
    }

    /// Put the player back on the departure cell.
    pub fn reset_player(&mut self) {
        self.player = self.departure();
    }

    pub fn set_visible(&mut self, addr: Address, visible: bool) {
        if let Some(cell) = self.cells.get_mut(addr.0) {
            cell.visible = visible;
        }
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        for cell in &mut self.cells {
            cell.visible = visible;
        }
    }

    /// Reveal the eight cells around `addr` on its floor.
    pub fn reveal_around(&mut self, addr: Address) {
        let (floor, row, column) = self.geometry.locate(addr);
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let r = row as isize + dr;
                let c = column as isize + dc;
                if r < 0 || c < 0 {
                    continue;
                }
                let (r, c) = (r as usize, c as usize);
                if self.geometry.contains(floor, r, c) {
                    let a = self.geometry.address(floor, r, c);
                    self.cells[a.0].visible = true;
                }
            }
        }
    }
}

// ── Board transforms ──

impl Level {
    /// Reverse the column order of `floor`.
    pub fn mirror_horizontal(&mut self, floor: usize) {
        let columns = self.geometry.columns;
        self.permute_floor(floor, 0, |r, c| (r, columns - 1 - c));
    }

    /// Reverse the row order of `floor`.
    pub fn mirror_vertical(&mut self, floor: usize) {
        let rows = self.geometry.rows;
        self.permute_floor(floor, 0, |r, c| (rows - 1 - r, c));
    }

    /// Point reflection through the centre of `floor`.
    pub fn reflect_diagonal(&mut self, floor: usize) {
        let Geometry { rows, columns, .. } = self.geometry;
        self.permute_floor(floor, 0, |r, c| (rows - 1 - r, columns - 1 - c));
    }

    /// Rotate `floor` clockwise by `degrees` (a multiple of 90, may be
    /// negative). On a non-square floor the centred square of side
    /// min(rows, columns) turns; cells outside it stay put.
    /// Rotation-class kinds change orientation through the rotation table.
    pub fn rotate(&mut self, floor: usize, degrees: i32) {
        if degrees % 90 != 0 {
            log::warn!("ignoring rotation by {degrees} degrees on floor {floor}");
            return;
        }
        let turns = (degrees / 90).rem_euclid(4);
        if turns == 0 {
            return;
        }
        let Geometry { rows, columns, .. } = self.geometry;
        let side = rows.min(columns);
        let row_off = (rows - side) / 2;
        let col_off = (columns - side) / 2;
        self.permute_floor(floor, turns, move |r, c| {
            let inside = r >= row_off && r < row_off + side && c >= col_off && c < col_off + side;
            if !inside {
                return (r, c);
            }
            let (mut lr, mut lc) = (r - row_off, c - col_off);
            for _ in 0..turns {
                let next = (lc, side - 1 - lr);
                lr = next.0;
                lc = next.1;
            }
            (lr + row_off, lc + col_off)
        });
    }

    /// Move the four quadrants of `floor` one step clockwise:
    /// top-left → top-right → bottom-right → bottom-left → top-left.
    /// A middle row/column (odd dimension) stays in place.
    pub fn rotate_quadrants(&mut self, floor: usize) {
        let Geometry { rows, columns, .. } = self.geometry;
        let h = rows / 2;
        let w = columns / 2;
        let bottom = rows - h;
        let right = columns - w;
        self.permute_floor(floor, 0, move |r, c| {
            let top_half = r < h;
            let bottom_half = r >= bottom;
            let left_half = c < w;
            let right_half = c >= right;
            match (top_half, bottom_half, left_half, right_half) {
                (true, _, true, _) => (r, c + right),
                (true, _, _, true) => (r + bottom, c),
                (_, true, _, true) => (r, c - right),
                (_, true, true, _) => (r - bottom, c),
                _ => (r, c),
            }
        });
    }

    /// Apply a position permutation to one floor.
    /// `dest(row, column)` gives where the cell currently at (row, column) goes.
    fn permute_floor<F>(&mut self, floor: usize, quarter_turns: i32, dest: F)
    where
        F: Fn(usize, usize) -> (usize, usize),
    {
        if floor >= self.geometry.floors {
            log::warn!("transform requested on missing floor {floor}");
            return;
        }
        let Geometry { rows, columns, .. } = self.geometry;
        let per_floor = self.geometry.cells_per_floor();
        let base = floor * per_floor;

        let old: Vec<(CellKind, bool)> = self.cells[base..base + per_floor]
            .iter()
            .map(|c| (c.kind, c.visible))
            .collect();
        let mut moved_player = None;

        for r in 0..rows {
            for c in 0..columns {
                let (dr, dc) = dest(r, c);
                let (kind, visible) = old[r * columns + c];
                let target = &mut self.cells[base + dr * columns + dc];
                target.kind = kind.rotated(quarter_turns);
                target.visible = visible;
                if self.player.0 == base + r * columns + c {
                    moved_player = Some(Address(base + dr * columns + dc));
                }
            }
        }

        if let Some(p) = moved_player {
            self.player = p;
        }
    }
}

/// Build a level from character diagrams, one slice of rows per floor.
#[cfg(test)]
pub fn level_from_rows(floors: &[&[&str]]) -> Level {
    let rows = floors[0].len();
    let columns = floors[0][0].chars().count();
    let chars: Vec<char> = floors.iter().flat_map(|f| f.iter().flat_map(|r| r.chars())).collect();
    Level::from_characters(Geometry::new(floors.len(), rows, columns), &chars)
        .expect("test fixture must be a valid level")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of_floor(level: &Level, floor: usize) -> Vec<String> {
        let g = level.geometry();
        level.floor_cells(floor)
            .chunks(g.columns)
            .map(|row| row.iter().map(|c| c.kind.to_char()).collect())
            .collect()
    }

    // ── Loading ──

    #[test]
    fn characters_round_trip() {
        let level = level_from_rows(&[
            &["D.*#", ".HV.", "LRQ!", "+-Tt"],
            &["S.s.", "Ee.X", "....", "...A"],
        ]);
        let chars = level.to_characters();
        let back = Level::from_characters(level.geometry(), &chars).unwrap();
        assert_eq!(back, level);
        assert_eq!(back.to_characters(), chars);
    }

    #[test]
    fn rejects_wrong_length() {
        let chars: Vec<char> = "D..A.".chars().collect();
        let err = Level::from_characters(Geometry::new(1, 2, 2), &chars).unwrap_err();
        assert_eq!(err, LevelLoadError::WrongLength { expected: 4, actual: 5 });
    }

    #[test]
    fn rejects_unknown_character() {
        let chars: Vec<char> = "D.?A".chars().collect();
        let err = Level::from_characters(Geometry::new(1, 2, 2), &chars).unwrap_err();
        assert_eq!(err, LevelLoadError::UnknownCell { index: 2, ch: '?' });
    }

    #[test]
    fn rejects_departure_and_arrival_counts() {
        let g = Geometry::new(1, 2, 2);
        let cases: [(&str, LevelLoadError); 4] = [
            ("...A", LevelLoadError::MissingDeparture),
            ("DD.A", LevelLoadError::MultipleDepartures(2)),
            ("D...", LevelLoadError::MissingArrival),
            ("DAAA", LevelLoadError::MultipleArrivals(3)),
        ];
        for (text, expected) in cases {
            let chars: Vec<char> = text.chars().collect();
            assert_eq!(Level::from_characters(g, &chars).unwrap_err(), expected, "{text}");
        }
    }

    #[test]
    fn rejects_empty_geometry() {
        assert_eq!(
            Level::from_characters(Geometry::new(0, 4, 4), &[]).unwrap_err(),
            LevelLoadError::EmptyGeometry,
        );
    }

    #[test]
    fn aggregates() {
        let level = level_from_rows(&[
            &["D*..", "..*.", "....", "...."],
            &["....", ".*..", "...A", "...."],
            &["####", "####", "####", "####"],
        ]);
        assert_eq!(level.total_stars(), 3);
        assert_eq!(level.last_playable_floor(), 1);
        assert_eq!(level.player(), Address(0));
        assert_eq!(level.departure(), Address(0));
    }

    // ── Addressing ──

    #[test]
    fn cell_at_bounds() {
        let level = level_from_rows(&[&["D..", "..A"]]);
        assert_eq!(level.cell_at(0, 1, 2).unwrap().kind, CellKind::Arrival);
        assert_eq!(
            level.cell_at(0, 2, 0).unwrap_err(),
            GridError::OutOfRange { floor: 0, row: 2, column: 0 },
        );
        assert!(level.cell_at(1, 0, 0).is_err());
        assert!(level.cell_at(0, 0, 3).is_err());
    }

    #[test]
    fn cells_know_their_position() {
        let level = level_from_rows(&[&["D..", "..."], &["...", "..A"]]);
        let c = level.cell_at(1, 1, 2).unwrap();
        assert_eq!((c.floor, c.row, c.column), (1, 1, 2));
    }

    #[test]
    fn floor_above_and_below() {
        let level = level_from_rows(&[&["D.", ".."], &["..", ".A"]]);
        let g = level.geometry();
        let a = g.address(0, 1, 0);
        assert_eq!(level.floor_above(a), Some(g.address(1, 1, 0)));
        assert_eq!(level.floor_below(a), None);
        let b = g.address(1, 0, 1);
        assert_eq!(level.floor_above(b), None);
        assert_eq!(level.floor_below(b), Some(g.address(0, 0, 1)));
    }

    // ── Mutation ──

    #[test]
    fn empty_spares_protected_kinds() {
        let mut level = level_from_rows(&[&["D*Ss", "Ee.A"]]);
        let g = level.geometry();
        assert!(level.empty(g.address(0, 0, 1)));
        assert_eq!(level.kind_at(g.address(0, 0, 1)), CellKind::Empty);
        for (r, c) in [(0, 0), (0, 2), (0, 3), (1, 0), (1, 1), (1, 3)] {
            let a = g.address(0, r, c);
            let before = level.kind_at(a);
            assert!(!level.empty(a));
            assert_eq!(level.kind_at(a), before);
        }
    }

    #[test]
    fn reveal_around_stays_on_floor() {
        let mut level = level_from_rows(&[&["D..", "...", "..A"], &["...", "...", "..."]]);
        level.set_all_visible(false);
        let g = level.geometry();
        level.reveal_around(g.address(0, 0, 0));
        let visible: Vec<bool> = level.cells().iter().map(|c| c.visible).collect();
        let expected_visible = [g.address(0, 0, 1), g.address(0, 1, 0), g.address(0, 1, 1)];
        for (i, v) in visible.iter().enumerate() {
            assert_eq!(*v, expected_visible.contains(&Address(i)), "cell {i}");
        }
    }

    // ── Transforms ──

    #[test]
    fn mirror_horizontal_reverses_columns_and_carries_player() {
        let mut level = level_from_rows(&[&["D*..", "...A"]]);
        level.mirror_horizontal(0);
        assert_eq!(kinds_of_floor(&level, 0), vec!["..*D", "A..."]);
        assert_eq!(level.player(), level.geometry().address(0, 0, 3));
    }

    #[test]
    fn mirror_vertical_reverses_rows() {
        let mut level = level_from_rows(&[&["D*..", "....", "...A"]]);
        level.mirror_vertical(0);
        assert_eq!(kinds_of_floor(&level, 0), vec!["...A", "....", "D*.."]);
        assert_eq!(level.player(), level.geometry().address(0, 2, 0));
    }

    #[test]
    fn diagonal_is_point_reflection() {
        let mut level = level_from_rows(&[&["D*.", "..A"]]);
        level.reflect_diagonal(0);
        assert_eq!(kinds_of_floor(&level, 0), vec!["A..", ".*D"]);
    }

    #[test]
    fn transforms_touch_one_floor_only() {
        let mut level = level_from_rows(&[&["D*..", "...."], &["*...", "...A"]]);
        level.mirror_horizontal(0);
        assert_eq!(kinds_of_floor(&level, 1), vec!["*...", "...A"]);
    }

    #[test]
    fn rotate_square_floor_clockwise() {
        let mut level = level_from_rows(&[&["D*.", "...", "H.A"]]);
        level.rotate(0, 90);
        // clockwise: left column becomes top row
        assert_eq!(kinds_of_floor(&level, 0), vec!["V.D", "..*", "A.."]);
        assert_eq!(level.player(), level.geometry().address(0, 0, 2));
    }

    #[test]
    fn rotate_left_undoes_rotate_right() {
        let mut level = level_from_rows(&[&["D*.H", "....", "..V.", "!..A"]]);
        let before = level.clone();
        level.rotate(0, 90);
        level.rotate(0, -90);
        assert_eq!(level, before);
    }

    #[test]
    fn full_turn_is_identity() {
        let mut level = level_from_rows(&[&["D*.H", "....", "..V.", "!..A"]]);
        let before = level.clone();
        level.rotate(0, 360);
        assert_eq!(level, before);
        level.rotate(0, 45);
        assert_eq!(level, before);
    }

    #[test]
    fn rotate_non_square_turns_centred_square() {
        let mut level = level_from_rows(&[&["#D*#", "#.A#"]]);
        level.rotate(0, 90);
        // 2x4: square is columns 1..=2, outer columns untouched
        assert_eq!(kinds_of_floor(&level, 0), vec!["#.D#", "#A*#"]);
        assert_eq!(level.geometry().locate(level.player()), (0, 0, 2));
    }

    #[test]
    fn quadrants_move_clockwise() {
        let mut level = level_from_rows(&[&["D*", "A!"]]);
        level.rotate_quadrants(0);
        assert_eq!(kinds_of_floor(&level, 0), vec!["AD", "!*"]);
        assert_eq!(level.player(), level.geometry().address(0, 0, 1));
    }

    #[test]
    fn quadrants_keep_middle_line_with_odd_size() {
        let mut level = level_from_rows(&[&["D#*", "###", "A#!"]]);
        level.rotate_quadrants(0);
        assert_eq!(kinds_of_floor(&level, 0), vec!["A#D", "###", "!#*"]);
    }

    #[test]
    fn four_quadrant_steps_restore_floor() {
        let mut level = level_from_rows(&[&["D*..", ".H..", "..V.", "!..A"]]);
        let before = level.clone();
        for _ in 0..4 {
            level.rotate_quadrants(0);
        }
        assert_eq!(level, before);
    }
}
