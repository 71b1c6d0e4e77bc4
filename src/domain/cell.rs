/// Cell types and the cells that carry them.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CellKind {
    Wall,
    Empty,
    Departure,
    Arrival,
    Star,
    MoreLife,
    LessLife,         // a.k.a. damage
    MoreTime,
    LessTime,
    StairsUp,
    StairsDown,
    ElevatorUp,
    ElevatorDown,
    HorizontalMirror,
    VerticalMirror,
    Diagonal,
    RotateLeft,
    RotateRight,
    QuarterRotation,
    Light,
}

impl CellKind {
    pub const ALL: [CellKind; 20] = [
        CellKind::Wall,
        CellKind::Empty,
        CellKind::Departure,
        CellKind::Arrival,
        CellKind::Star,
        CellKind::MoreLife,
        CellKind::LessLife,
        CellKind::MoreTime,
        CellKind::LessTime,
        CellKind::StairsUp,
        CellKind::StairsDown,
        CellKind::ElevatorUp,
        CellKind::ElevatorDown,
        CellKind::HorizontalMirror,
        CellKind::VerticalMirror,
        CellKind::Diagonal,
        CellKind::RotateLeft,
        CellKind::RotateRight,
        CellKind::QuarterRotation,
        CellKind::Light,
    ];

    /// Character used by the flat grid format.
    pub fn to_char(self) -> char {
        match self {
            CellKind::Wall => '#',
            CellKind::Empty => '.',
            CellKind::Departure => 'D',
            CellKind::Arrival => 'A',
            CellKind::Star => '*',
            CellKind::MoreLife => '+',
            CellKind::LessLife => '-',
            CellKind::MoreTime => 'T',
            CellKind::LessTime => 't',
            CellKind::StairsUp => 'S',
            CellKind::StairsDown => 's',
            CellKind::ElevatorUp => 'E',
            CellKind::ElevatorDown => 'e',
            CellKind::HorizontalMirror => 'H',
            CellKind::VerticalMirror => 'V',
            CellKind::Diagonal => 'X',
            CellKind::RotateLeft => 'L',
            CellKind::RotateRight => 'R',
            CellKind::QuarterRotation => 'Q',
            CellKind::Light => '!',
        }
    }

    pub fn from_char(ch: char) -> Option<CellKind> {
        CellKind::ALL.iter().copied().find(|k| k.to_char() == ch)
    }

    /// Can the player stand on this cell?
    pub fn is_traversable(self) -> bool {
        self != CellKind::Wall
    }

    /// Protected cells survive the player leaving them.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            CellKind::Departure
                | CellKind::Arrival
                | CellKind::StairsUp
                | CellKind::StairsDown
                | CellKind::ElevatorUp
                | CellKind::ElevatorDown
        )
    }

    /// Cells that move the player to another floor.
    pub fn is_floor_link(self) -> bool {
        matches!(
            self,
            CellKind::StairsUp | CellKind::StairsDown | CellKind::ElevatorUp | CellKind::ElevatorDown
        )
    }

    /// Does this cell make its floor count as playable?
    pub fn is_content(self) -> bool {
        !matches!(self, CellKind::Wall | CellKind::Empty)
    }

    /// Type after the board turned by `quarter_turns` × 90°.
    /// Mirrors change orientation on odd turns; everything else is invariant.
    pub fn rotated(self, quarter_turns: i32) -> CellKind {
        if quarter_turns.rem_euclid(2) == 0 {
            return self;
        }
        match self {
            CellKind::HorizontalMirror => CellKind::VerticalMirror,
            CellKind::VerticalMirror => CellKind::HorizontalMirror,
            other => other,
        }
    }
}

impl Default for CellKind {
    fn default() -> Self {
        CellKind::Empty
    }
}

/// A single tile. Position comes from the flat index and never changes;
/// board transforms move kind and visibility from cell to cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub kind: CellKind,
    pub floor: usize,
    pub row: usize,
    pub column: usize,
    pub visible: bool,
}

impl Cell {
    pub fn new(kind: CellKind, floor: usize, row: usize, column: usize) -> Self {
        Cell { kind, floor, row, column, visible: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_is_a_bijection() {
        for kind in CellKind::ALL {
            assert_eq!(CellKind::from_char(kind.to_char()), Some(kind));
        }
        let mut chars: Vec<char> = CellKind::ALL.iter().map(|k| k.to_char()).collect();
        chars.sort_unstable();
        chars.dedup();
        assert_eq!(chars.len(), CellKind::ALL.len());
    }

    #[test]
    fn unknown_char_has_no_kind() {
        assert_eq!(CellKind::from_char('?'), None);
        assert_eq!(CellKind::from_char(' '), None);
    }

    #[test]
    fn protected_kinds() {
        let protected: Vec<CellKind> = CellKind::ALL.iter().copied().filter(|k| k.is_protected()).collect();
        assert_eq!(protected, vec![
            CellKind::Departure,
            CellKind::Arrival,
            CellKind::StairsUp,
            CellKind::StairsDown,
            CellKind::ElevatorUp,
            CellKind::ElevatorDown,
        ]);
    }

    #[test]
    fn mirrors_swap_on_odd_turns_only() {
        assert_eq!(CellKind::HorizontalMirror.rotated(1), CellKind::VerticalMirror);
        assert_eq!(CellKind::VerticalMirror.rotated(-1), CellKind::HorizontalMirror);
        assert_eq!(CellKind::HorizontalMirror.rotated(2), CellKind::HorizontalMirror);
        assert_eq!(CellKind::Diagonal.rotated(1), CellKind::Diagonal);
        assert_eq!(CellKind::Star.rotated(3), CellKind::Star);
    }

    #[test]
    fn only_walls_block() {
        for kind in CellKind::ALL {
            assert_eq!(kind.is_traversable(), kind != CellKind::Wall);
        }
    }
}
