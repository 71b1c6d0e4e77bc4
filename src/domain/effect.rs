/// Cell effects: "the player entered a cell of kind X" → what happened.
///
/// One exhaustive match over `CellKind`. The resolver updates the counters
/// it is handed and reports an outcome; it never touches the grid and never
/// runs an animation. Board changes come back as an `AnimationRequest` for
/// the scheduler.
///
/// ## Effect Table
///
/// ┌──────────────────────┬────────────────────────────────────────────┐
/// │ Entered              │ Effect                                     │
/// ├──────────────────────┼────────────────────────────────────────────┤
/// │ Star                 │ found_stars + 1 (never above total)        │
/// │ MoreLife / LessLife  │ lives ± 1; LessLife at 0 lives → Lose      │
/// │ MoreTime / LessTime  │ watching budget ± 3 s, never below 3 s     │
/// │                      │ (a budget already under 3 s is left as is) │
/// │ Stairs               │ floor ± 1 if that floor is playable        │
/// │ Elevator             │ last playable floor / floor 0              │
/// │ Mirror / Rotation    │ board transform on the current floor       │
/// │ Light                │ reveal the 8 surrounding cells             │
/// │ Arrival              │ Win iff every star is found                │
/// │ anything else        │ nothing                                    │
/// └──────────────────────┴────────────────────────────────────────────┘
///
/// A floor change also needs a traversable landing cell at the player's
/// row and column on the target floor; otherwise it is ignored.

use super::address::{Address, FloorDirection};
use super::cell::CellKind;
use super::grid::Level;
use super::transform::AnimationRequest;

/// Seconds a time cell adds to or removes from the watching budget.
pub const TIME_STEP: u32 = 3;
/// The watching budget never drops below this.
pub const MIN_WATCHING_TIME: u32 = 3;

/// Session counters the resolver may change.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Counters {
    pub found_stars: u32,
    pub lives: u32,
    /// Per-floor watching budget in seconds, carried to the next level.
    pub watching_time: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Ending {
    Win,
    Lose,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EffectOutcome {
    NoOp,
    StarFound,
    LifeGained,
    LifeLost,
    TimeGained,
    TimeLost,
    FloorChangeRequested { direction: FloorDirection, animation: AnimationRequest },
    BoardTransformRequested { animation: AnimationRequest },
    ArrivalReached,
    NeighborsRevealed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Resolution {
    pub outcome: EffectOutcome,
    /// Set when this effect ends the session.
    pub ending: Option<Ending>,
}

impl Resolution {
    fn of(outcome: EffectOutcome) -> Self {
        Resolution { outcome, ending: None }
    }
}

/// Resolve the cell the player just entered. The player already stands on
/// it (`level.player()`).
pub fn resolve(counters: &mut Counters, level: &Level, entered: CellKind) -> Resolution {
    let floor = level.player_floor();
    let player = level.player();

    match entered {
        CellKind::Star => {
            if counters.found_stars < level.total_stars() {
                counters.found_stars += 1;
            }
            Resolution::of(EffectOutcome::StarFound)
        }
        CellKind::MoreLife => {
            counters.lives += 1;
            Resolution::of(EffectOutcome::LifeGained)
        }
        CellKind::LessLife => {
            if counters.lives == 0 {
                Resolution { outcome: EffectOutcome::LifeLost, ending: Some(Ending::Lose) }
            } else {
                counters.lives -= 1;
                Resolution::of(EffectOutcome::LifeLost)
            }
        }
        CellKind::MoreTime => {
            counters.watching_time += TIME_STEP;
            Resolution::of(EffectOutcome::TimeGained)
        }
        CellKind::LessTime => {
            if counters.watching_time > MIN_WATCHING_TIME {
                counters.watching_time = counters.watching_time.saturating_sub(TIME_STEP).max(MIN_WATCHING_TIME);
            }
            Resolution::of(EffectOutcome::TimeLost)
        }
        CellKind::StairsUp => floor_change(level, FloorDirection::Up, level.floor_above(player)),
        CellKind::StairsDown => floor_change(level, FloorDirection::Down, level.floor_below(player)),
        CellKind::ElevatorUp => {
            let landing = level.geometry().on_floor(player, level.last_playable_floor());
            floor_change(level, FloorDirection::Up, landing)
        }
        CellKind::ElevatorDown => floor_change(level, FloorDirection::Down, level.geometry().on_floor(player, 0)),
        CellKind::HorizontalMirror
        | CellKind::VerticalMirror
        | CellKind::Diagonal
        | CellKind::RotateLeft
        | CellKind::RotateRight
        | CellKind::QuarterRotation => match AnimationRequest::board_transform(entered, floor) {
            Some(animation) => Resolution::of(EffectOutcome::BoardTransformRequested { animation }),
            None => Resolution::of(EffectOutcome::NoOp),
        },
        CellKind::Light => Resolution::of(EffectOutcome::NeighborsRevealed),
        CellKind::Arrival => {
            let ending = (counters.found_stars == level.total_stars()).then_some(Ending::Win);
            Resolution { outcome: EffectOutcome::ArrivalReached, ending }
        }
        CellKind::Empty | CellKind::Departure | CellKind::Wall => Resolution::of(EffectOutcome::NoOp),
    }
}

/// Floor change onto `landing`, if it lies on a different, playable floor
/// and the player can stand there.
fn floor_change(level: &Level, direction: FloorDirection, landing: Option<Address>) -> Resolution {
    let from = level.player_floor();
    let Some(landing) = landing else {
        return suppressed(from, "floor change");
    };
    let to = level.floor_of(landing);
    let legal = match direction {
        FloorDirection::Up => to > from,
        FloorDirection::Down => to < from,
    };
    if !legal || to > level.last_playable_floor() {
        return suppressed(from, "floor change");
    }
    if !level.kind_at(landing).is_traversable() {
        log::debug!("floor change {from} -> {to} blocked by {:?}", level.kind_at(landing));
        return Resolution::of(EffectOutcome::NoOp);
    }
    let animation = match direction {
        FloorDirection::Up => AnimationRequest::StairsUp { from, to },
        FloorDirection::Down => AnimationRequest::StairsDown { from, to },
    };
    Resolution::of(EffectOutcome::FloorChangeRequested { direction, animation })
}

fn suppressed(floor: usize, what: &str) -> Resolution {
    log::debug!("{what} on floor {floor} has no destination; ignored");
    Resolution::of(EffectOutcome::NoOp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::address::Address;
    use crate::domain::grid::level_from_rows;

    fn counters() -> Counters {
        Counters { found_stars: 0, lives: 2, watching_time: 5 }
    }

    /// Three floors; player placed with `put`.
    fn tower() -> Level {
        level_from_rows(&[
            &["D*SE", "s*..", "...."],
            &["Ss..", "..*.", "eE.."],
            &["s...", "e...", "...A"],
        ])
    }

    fn put(level: &mut Level, floor: usize, row: usize, column: usize) -> CellKind {
        let a = level.geometry().address(floor, row, column);
        level.set_player(a);
        level.kind_at(a)
    }

    #[test]
    fn star_counts_up_to_total() {
        let level = tower();
        let mut c = counters();
        for expected in 1..=3 {
            let r = resolve(&mut c, &level, CellKind::Star);
            assert_eq!(r.outcome, EffectOutcome::StarFound);
            assert_eq!(c.found_stars, expected);
        }
        resolve(&mut c, &level, CellKind::Star);
        assert_eq!(c.found_stars, level.total_stars());
    }

    #[test]
    fn lives_clamp_and_lose_at_zero() {
        let level = tower();
        let mut c = counters();
        assert_eq!(resolve(&mut c, &level, CellKind::MoreLife).outcome, EffectOutcome::LifeGained);
        assert_eq!(c.lives, 3);
        for _ in 0..3 {
            let r = resolve(&mut c, &level, CellKind::LessLife);
            assert_eq!(r.ending, None);
        }
        assert_eq!(c.lives, 0);
        let r = resolve(&mut c, &level, CellKind::LessLife);
        assert_eq!(r.outcome, EffectOutcome::LifeLost);
        assert_eq!(r.ending, Some(Ending::Lose));
        assert_eq!(c.lives, 0);
    }

    #[test]
    fn time_cells_move_budget_with_floor_of_three() {
        let level = tower();
        let mut c = counters();
        resolve(&mut c, &level, CellKind::MoreTime);
        assert_eq!(c.watching_time, 8);
        resolve(&mut c, &level, CellKind::LessTime);
        resolve(&mut c, &level, CellKind::LessTime);
        assert_eq!(c.watching_time, MIN_WATCHING_TIME);
        assert_eq!(resolve(&mut c, &level, CellKind::LessTime).outcome, EffectOutcome::TimeLost);
        assert_eq!(c.watching_time, MIN_WATCHING_TIME);
    }

    #[test]
    fn time_lost_never_raises_a_short_budget() {
        let level = tower();
        let mut c = Counters { watching_time: 1, ..counters() };
        assert_eq!(resolve(&mut c, &level, CellKind::LessTime).outcome, EffectOutcome::TimeLost);
        assert_eq!(c.watching_time, 1);
        c.watching_time = 4;
        resolve(&mut c, &level, CellKind::LessTime);
        assert_eq!(c.watching_time, MIN_WATCHING_TIME);
    }

    #[test]
    fn stairs_up_from_ground_floor() {
        let mut level = tower();
        let kind = put(&mut level, 0, 0, 2);
        let r = resolve(&mut counters(), &level, kind);
        assert_eq!(r.outcome, EffectOutcome::FloorChangeRequested {
            direction: FloorDirection::Up,
            animation: AnimationRequest::StairsUp { from: 0, to: 1 },
        });
    }

    #[test]
    fn stairs_down_on_first_floor_is_suppressed() {
        let mut level = tower();
        let kind = put(&mut level, 0, 1, 0);
        assert_eq!(kind, CellKind::StairsDown);
        assert_eq!(resolve(&mut counters(), &level, kind).outcome, EffectOutcome::NoOp);
    }

    #[test]
    fn stairs_up_on_last_floor_is_suppressed() {
        let mut level = level_from_rows(&[&["D.", "*."], &["S.", ".A"]]);
        let kind = put(&mut level, 1, 0, 0);
        assert_eq!(kind, CellKind::StairsUp);
        assert_eq!(resolve(&mut counters(), &level, kind).outcome, EffectOutcome::NoOp);
    }

    #[test]
    fn stairs_up_into_unplayable_floor_is_suppressed() {
        let mut level = level_from_rows(&[&["DS", ".A"], &["##", "##"]]);
        let kind = put(&mut level, 0, 0, 1);
        assert_eq!(level.last_playable_floor(), 0);
        assert_eq!(resolve(&mut counters(), &level, kind).outcome, EffectOutcome::NoOp);
    }

    #[test]
    fn floor_change_onto_wall_is_suppressed() {
        let mut level = level_from_rows(&[&["DS", "*."], &[".#", ".A"]]);
        let kind = put(&mut level, 0, 0, 1);
        assert_eq!(kind, CellKind::StairsUp);
        assert_eq!(resolve(&mut counters(), &level, kind).outcome, EffectOutcome::NoOp);

        let mut level = level_from_rows(&[&["#D", ".S"], &["e.", "sA"]]);
        let kind = put(&mut level, 1, 0, 0);
        assert_eq!(kind, CellKind::ElevatorDown);
        assert_eq!(resolve(&mut counters(), &level, kind).outcome, EffectOutcome::NoOp);
        // same floors, open landing
        let kind = put(&mut level, 1, 1, 0);
        assert_eq!(resolve(&mut counters(), &level, kind).outcome, EffectOutcome::FloorChangeRequested {
            direction: FloorDirection::Down,
            animation: AnimationRequest::StairsDown { from: 1, to: 0 },
        });
    }

    #[test]
    fn elevators_travel_to_extreme_floors() {
        let mut level = tower();
        let kind = put(&mut level, 0, 0, 3);
        assert_eq!(resolve(&mut counters(), &level, kind).outcome, EffectOutcome::FloorChangeRequested {
            direction: FloorDirection::Up,
            animation: AnimationRequest::StairsUp { from: 0, to: 2 },
        });
        let kind = put(&mut level, 2, 1, 0);
        assert_eq!(resolve(&mut counters(), &level, kind).outcome, EffectOutcome::FloorChangeRequested {
            direction: FloorDirection::Down,
            animation: AnimationRequest::StairsDown { from: 2, to: 0 },
        });
        // elevator up on the last floor goes nowhere
        let mut flat = level_from_rows(&[&["DE", ".A"]]);
        let kind = put(&mut flat, 0, 0, 1);
        assert_eq!(resolve(&mut counters(), &flat, kind).outcome, EffectOutcome::NoOp);
    }

    #[test]
    fn transform_cells_request_animation_on_current_floor() {
        let mut level = level_from_rows(&[&["D.", ".."], &["Q.", ".A"]]);
        let kind = put(&mut level, 1, 0, 0);
        let r = resolve(&mut counters(), &level, kind);
        assert_eq!(r.outcome, EffectOutcome::BoardTransformRequested {
            animation: AnimationRequest::QuarterRotation { floor: 1 },
        });
        assert_eq!(r.ending, None);
    }

    #[test]
    fn arrival_wins_only_with_every_star() {
        let level = tower();
        let mut c = counters();
        c.found_stars = 2;
        let r = resolve(&mut c, &level, CellKind::Arrival);
        assert_eq!(r.outcome, EffectOutcome::ArrivalReached);
        assert_eq!(r.ending, None);
        c.found_stars = 3;
        assert_eq!(resolve(&mut c, &level, CellKind::Arrival).ending, Some(Ending::Win));
    }

    #[test]
    fn inert_cells() {
        let mut level = tower();
        level.set_player(Address(0));
        let before = counters();
        for kind in [CellKind::Empty, CellKind::Departure, CellKind::Wall] {
            let mut c = before;
            let r = resolve(&mut c, &level, kind);
            assert_eq!(r, Resolution { outcome: EffectOutcome::NoOp, ending: None });
            assert_eq!(c, before);
        }
        assert_eq!(
            resolve(&mut counters(), &level, CellKind::Light).outcome,
            EffectOutcome::NeighborsRevealed,
        );
    }
}
