/// Movement rules, truth-table driven.
///
/// Pure functions over the grid with no side effects.
/// These encode "what is legal" without performing the move.
///
/// ## Movement Truth Table
///
/// ┌───────────────────────────────┬─────────┬──────────────────────┐
/// │ Condition                      │ Allow?  │ Notes                │
/// ├───────────────────────────────┼─────────┼──────────────────────┤
/// │ Player address outside grid    │ DENY    │ corrupt address      │
/// │ Dest off the current floor     │ DENY    │ edge, no row wrap    │
/// │ Dest cell is Wall              │ DENY    │ collision cue        │
/// │ Otherwise                      │ ALLOW   │                      │
/// └───────────────────────────────┴─────────┴──────────────────────┘
///
/// Input suppression while a board animation runs is the session's job,
/// not a rule: the validator answers for the grid as it is.

use super::address::{Address, Direction};
use super::grid::Level;

/// Destination of a legal move, or None if the move is blocked.
pub fn destination(level: &Level, from: Address, dir: Direction) -> Option<Address> {
    let to = level.neighbor(from, dir)?;
    if level.kind_at(to).is_traversable() {
        Some(to)
    } else {
        None
    }
}

/// May the player step from `from` in `dir`?
pub fn can_move(level: &Level, from: Address, dir: Direction) -> bool {
    destination(level, from, dir).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::CellKind;
    use crate::domain::grid::level_from_rows;

    /// Fixed fixture:
    ///   row 0:  # . # .
    ///   row 1:  . D . #
    ///   row 2:  # . * .
    ///   row 3:  . . # A
    fn fixture() -> Level {
        level_from_rows(&[
            &["#.#.", ".D.#", "#.*.", "..#A"],
            &["....", "....", "....", "...."],
        ])
    }

    #[test]
    fn open_in_all_four_directions() {
        let level = fixture();
        let g = level.geometry();
        let from = g.address(0, 1, 1);
        for dir in Direction::ALL {
            assert!(can_move(&level, from, dir), "{dir:?}");
        }
        assert_eq!(destination(&level, from, Direction::Up), Some(g.address(0, 0, 1)));
        assert_eq!(destination(&level, from, Direction::Right), Some(g.address(0, 1, 2)));
    }

    #[test]
    fn walls_block_in_all_four_directions() {
        let level = fixture();
        let g = level.geometry();
        // (2,1): up=D(1,1) ok; left=(2,0) wall; down=(3,1) ok; right=(2,2) star
        assert!(!can_move(&level, g.address(0, 2, 1), Direction::Left));
        // (1,2): right=(1,3) wall, up=(0,2) wall
        assert!(!can_move(&level, g.address(0, 1, 2), Direction::Right));
        assert!(!can_move(&level, g.address(0, 1, 2), Direction::Up));
        // (2,2): down=(3,2) wall
        assert!(!can_move(&level, g.address(0, 2, 2), Direction::Down));
    }

    #[test]
    fn edges_block_and_never_change_floor() {
        let level = fixture();
        let g = level.geometry();
        assert!(!can_move(&level, g.address(0, 0, 1), Direction::Up));
        assert!(!can_move(&level, g.address(0, 1, 0), Direction::Left));
        assert!(!can_move(&level, g.address(0, 0, 3), Direction::Right));
        // bottom row of floor 0: floor 1 is open but unreachable by walking
        assert!(!can_move(&level, g.address(0, 3, 0), Direction::Down));
        assert!(!can_move(&level, g.address(1, 0, 0), Direction::Up));
    }

    #[test]
    fn blocked_exactly_when_off_grid_or_wall() {
        let level = fixture();
        let g = level.geometry();
        for i in 0..g.len() {
            let from = Address(i);
            for dir in Direction::ALL {
                let expected = match level.neighbor(from, dir) {
                    None => false,
                    Some(to) => level.kind_at(to) != CellKind::Wall,
                };
                assert_eq!(can_move(&level, from, dir), expected, "{i} {dir:?}");
            }
        }
    }

    #[test]
    fn address_outside_grid_is_denied() {
        let level = fixture();
        assert!(!can_move(&level, Address(10_000), Direction::Left));
    }
}
