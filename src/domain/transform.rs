/// Animation requests: what a cell asked the board to do.
///
/// A request is plain data. The scheduler owns it while it plays and calls
/// `apply()` once, on the frame the animation completes.

use super::cell::CellKind;
use super::grid::Level;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationKind {
    HorizontalMirror,
    VerticalMirror,
    Diagonal,
    RotateLeft,
    RotateRight,
    QuarterRotation,
    StairsUp,
    StairsDown,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationRequest {
    HorizontalMirror { floor: usize },
    VerticalMirror { floor: usize },
    Diagonal { floor: usize },
    RotateLeft { floor: usize },
    RotateRight { floor: usize },
    QuarterRotation { floor: usize },
    StairsUp { from: usize, to: usize },
    StairsDown { from: usize, to: usize },
}

impl AnimationRequest {
    /// Board transform triggered by entering a cell of `kind` on `floor`.
    pub fn board_transform(kind: CellKind, floor: usize) -> Option<AnimationRequest> {
        match kind {
            CellKind::HorizontalMirror => Some(AnimationRequest::HorizontalMirror { floor }),
            CellKind::VerticalMirror => Some(AnimationRequest::VerticalMirror { floor }),
            CellKind::Diagonal => Some(AnimationRequest::Diagonal { floor }),
            CellKind::RotateLeft => Some(AnimationRequest::RotateLeft { floor }),
            CellKind::RotateRight => Some(AnimationRequest::RotateRight { floor }),
            CellKind::QuarterRotation => Some(AnimationRequest::QuarterRotation { floor }),
            _ => None,
        }
    }

    pub fn kind(&self) -> AnimationKind {
        match self {
            AnimationRequest::HorizontalMirror { .. } => AnimationKind::HorizontalMirror,
            AnimationRequest::VerticalMirror { .. } => AnimationKind::VerticalMirror,
            AnimationRequest::Diagonal { .. } => AnimationKind::Diagonal,
            AnimationRequest::RotateLeft { .. } => AnimationKind::RotateLeft,
            AnimationRequest::RotateRight { .. } => AnimationKind::RotateRight,
            AnimationRequest::QuarterRotation { .. } => AnimationKind::QuarterRotation,
            AnimationRequest::StairsUp { .. } => AnimationKind::StairsUp,
            AnimationRequest::StairsDown { .. } => AnimationKind::StairsDown,
        }
    }

    /// Floor the animation plays on (departure floor for stairs).
    pub fn floor(&self) -> usize {
        match *self {
            AnimationRequest::HorizontalMirror { floor }
            | AnimationRequest::VerticalMirror { floor }
            | AnimationRequest::Diagonal { floor }
            | AnimationRequest::RotateLeft { floor }
            | AnimationRequest::RotateRight { floor }
            | AnimationRequest::QuarterRotation { floor } => floor,
            AnimationRequest::StairsUp { from, .. } | AnimationRequest::StairsDown { from, .. } => from,
        }
    }

    /// Destination floor of a floor change.
    pub fn target_floor(&self) -> Option<usize> {
        match *self {
            AnimationRequest::StairsUp { to, .. } | AnimationRequest::StairsDown { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn is_floor_change(&self) -> bool {
        self.target_floor().is_some()
    }

    /// Rotation sign in degrees, for rotations only.
    #[allow(dead_code)]
    pub fn degrees(&self) -> Option<i32> {
        match self {
            AnimationRequest::RotateLeft { .. } => Some(-90),
            AnimationRequest::RotateRight { .. } => Some(90),
            _ => None,
        }
    }

    /// Permute the board. Floor changes leave the grid alone; the session
    /// moves the player when it sees the finished request.
    pub fn apply(&self, level: &mut Level) {
        match *self {
            AnimationRequest::HorizontalMirror { floor } => level.mirror_horizontal(floor),
            AnimationRequest::VerticalMirror { floor } => level.mirror_vertical(floor),
            AnimationRequest::Diagonal { floor } => level.reflect_diagonal(floor),
            AnimationRequest::RotateLeft { floor } => level.rotate(floor, -90),
            AnimationRequest::RotateRight { floor } => level.rotate(floor, 90),
            AnimationRequest::QuarterRotation { floor } => level.rotate_quadrants(floor),
            AnimationRequest::StairsUp { .. } | AnimationRequest::StairsDown { .. } => {}
        }
    }
}
