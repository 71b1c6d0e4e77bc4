/// GameSession: one play-through of one level.
///
/// ## State machine
///
///   Watching ──(last floor shown)──► Playing ──(win / lose)──► Ending ──► outcome
///                                      │  ▲
///                          animation   ▼  │ animation finished
///                                  AnimationBlocked
///
///   - **Watching** (serie play only): every cell visible, one countdown per
///     playable floor. When the last floor has been shown the grid is hidden,
///     the player goes back to Departure and play begins.
///   - **Playing**: the playing countdown drops once per second. Directional
///     input is validated, applied, resolved and may start an animation.
///   - **AnimationBlocked**: Playing while the scheduler runs. Directional
///     input is swallowed, not queued. Timers keep running.
///   - **Ending{Win|Lose}**: frozen for `end_screen_ms`, then `outcome()`
///     reports `Won` / `Lost`.
///
/// ## Per-input ordering
///
///   1. Movement validation (`rules::can_move`)
///   2. Vacated cell emptied (protected kinds kept), player moved
///   3. Effect resolution (`effect::resolve`)
///   4. Animation start (scheduler), ending check
///
/// ## Per-tick ordering
///
///   1. Running animation advanced; a finished floor change moves the player
///   2. Countdown for the current phase
///
/// Escape ends the session on the frame it is processed.

use crate::domain::address::{Address, Direction, Geometry};
use crate::domain::cell::Cell;
use crate::domain::effect::{self, Counters, EffectOutcome, Ending, Resolution};
use crate::domain::grid::Level;
use crate::domain::rules;
use crate::domain::transform::AnimationRequest;
use super::animation::{Animation, AnimationScheduler, AnimationTiming};
use super::event::Cue;
use super::timer::{Countdown, WatchingPeriodTimer, WatchingStep};

/// How the session was started.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionMode {
    /// Playing a serie: watching period, time-over loss.
    Serie,
    /// Testing from the level editor: no watching period, no time-over.
    EditorTest,
}

/// Everything a session needs besides the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSetup {
    pub lives: u32,
    /// Seconds each floor is shown during the watching period.
    pub watching_time: u32,
    /// Seconds of play. 0 = no limit.
    pub playing_time: u32,
    pub animation: AnimationTiming,
    pub end_screen_ms: u64,
}

impl Default for SessionSetup {
    fn default() -> Self {
        SessionSetup {
            lives: 3,
            watching_time: 5,
            playing_time: 90,
            animation: AnimationTiming::default(),
            end_screen_ms: 2500,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    Watching,
    Playing,
    AnimationBlocked,
    Ending(Ending),
}

/// Why the session is over; tells the caller where control goes next.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionOutcome {
    /// Win screen done: next level of the serie.
    Won,
    /// Lose screen done: main menu.
    Lost,
    /// Arrival reached in editor test mode: back to the editor.
    ReturnToEditor,
    /// Escape: editor (test mode) or main menu.
    Aborted,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Watching,
    Playing,
    Ending { ending: Ending, remaining_ms: u64 },
}

/// Read-only view for the renderer / dashboard.
#[derive(Clone, Debug)]
pub struct Snapshot<'a> {
    pub state: SessionState,
    pub mode: SessionMode,
    pub current_floor: usize,
    pub found_stars: u32,
    pub total_stars: u32,
    pub lives: u32,
    pub watching_time_remaining: u32,
    pub watching_time: u32,
    pub playing_time_remaining: u32,
    pub player: Address,
    pub geometry: Geometry,
    pub cells: &'a [Cell],
    pub animation: Option<Animation>,
}

pub struct GameSession {
    level: Level,
    mode: SessionMode,
    phase: Phase,
    counters: Counters,
    current_floor: usize,
    watching: Option<WatchingPeriodTimer>,
    playing: Countdown,
    scheduler: AnimationScheduler,
    end_screen_ms: u64,
    outcome: Option<SessionOutcome>,
}

// ── Construction ──

impl GameSession {
    pub fn new(mut level: Level, mode: SessionMode, setup: SessionSetup) -> Self {
        level.reset_player();
        level.set_all_visible(true);

        let (phase, watching, current_floor) = match mode {
            SessionMode::Serie => (
                Phase::Watching,
                Some(WatchingPeriodTimer::new(setup.watching_time, level.last_playable_floor())),
                0,
            ),
            SessionMode::EditorTest => (Phase::Playing, None, level.player_floor()),
        };

        log::info!(
            "session start: {:?}, {} floor(s), {} star(s), {} lives",
            mode,
            level.last_playable_floor() + 1,
            level.total_stars(),
            setup.lives,
        );

        GameSession {
            level,
            mode,
            phase,
            counters: Counters {
                found_stars: 0,
                lives: setup.lives,
                watching_time: setup.watching_time,
            },
            current_floor,
            watching,
            playing: Countdown::new(setup.playing_time),
            scheduler: AnimationScheduler::new(setup.animation),
            end_screen_ms: setup.end_screen_ms,
            outcome: None,
        }
    }
}

// ── Queries ──

impl GameSession {
    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Watching => SessionState::Watching,
            Phase::Playing if self.scheduler.is_running() => SessionState::AnimationBlocked,
            Phase::Playing => SessionState::Playing,
            Phase::Ending { ending, .. } => SessionState::Ending(ending),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn current_floor(&self) -> usize {
        self.current_floor
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn playing_time_remaining(&self) -> u32 {
        self.playing.remaining()
    }

    pub fn watching_time_remaining(&self) -> u32 {
        match (&self.phase, &self.watching) {
            (Phase::Watching, Some(w)) => w.remaining(),
            _ => 0,
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            state: self.state(),
            mode: self.mode,
            current_floor: self.current_floor,
            found_stars: self.counters.found_stars,
            total_stars: self.level.total_stars(),
            lives: self.counters.lives,
            watching_time_remaining: self.watching_time_remaining(),
            watching_time: self.counters.watching_time,
            playing_time_remaining: self.playing.remaining(),
            player: self.level.player(),
            geometry: self.level.geometry(),
            cells: self.level.cells(),
            animation: self.scheduler.active().copied(),
        }
    }
}

// ── Input ──

impl GameSession {
    /// One directional key press.
    pub fn on_directional_input(&mut self, dir: Direction) -> Vec<Cue> {
        let mut cues = Vec::new();
        if self.outcome.is_some() || self.phase != Phase::Playing {
            return cues;
        }
        if self.scheduler.is_running() {
            return cues;
        }

        let from = self.level.player();
        if !rules::can_move(&self.level, from, dir) {
            if let Some(wall) = self.level.neighbor(from, dir) {
                self.level.set_visible(wall, true);
            }
            cues.push(Cue::Collision);
            return cues;
        }
        let Some(to) = self.level.neighbor(from, dir) else {
            return cues;
        };

        self.level.empty(from);
        self.level.set_player(to);
        self.level.set_visible(to, true);

        let entered = self.level.kind_at(to);
        let resolution = effect::resolve(&mut self.counters, &self.level, entered);
        self.apply_resolution(resolution, &mut cues);
        cues
    }

    /// Escape: accepted while watching or playing, animation included.
    pub fn on_escape(&mut self) -> Option<SessionOutcome> {
        if self.outcome.is_none() && matches!(self.phase, Phase::Watching | Phase::Playing) {
            log::info!("session aborted ({:?})", self.mode);
            self.outcome = Some(SessionOutcome::Aborted);
        }
        self.outcome
    }

    fn apply_resolution(&mut self, resolution: Resolution, cues: &mut Vec<Cue>) {
        match resolution.outcome {
            EffectOutcome::StarFound => cues.push(Cue::StarFound),
            EffectOutcome::LifeGained => cues.push(Cue::LifeGained),
            EffectOutcome::LifeLost => cues.push(Cue::LifeLost),
            EffectOutcome::TimeGained => cues.push(Cue::TimeGained),
            EffectOutcome::TimeLost => cues.push(Cue::TimeLost),
            EffectOutcome::FloorChangeRequested { animation, .. } => {
                if self.scheduler.start(animation) {
                    cues.push(Cue::FloorSwitch);
                }
            }
            EffectOutcome::BoardTransformRequested { animation } => {
                if self.scheduler.start(animation) {
                    cues.push(Cue::BoardTransform);
                }
            }
            EffectOutcome::NeighborsRevealed => {
                self.level.reveal_around(self.level.player());
                cues.push(Cue::Light);
            }
            EffectOutcome::ArrivalReached | EffectOutcome::NoOp => {}
        }

        if let Some(ending) = resolution.ending {
            self.end(ending, cues);
        }
    }
}

// ── Time ──

impl GameSession {
    /// Advance by `elapsed_ms` of frame time.
    pub fn tick(&mut self, elapsed_ms: u64) -> Vec<Cue> {
        let mut cues = Vec::new();
        if self.outcome.is_some() {
            return cues;
        }

        match self.phase {
            Phase::Watching => self.tick_watching(elapsed_ms, &mut cues),
            Phase::Playing => self.tick_playing(elapsed_ms, &mut cues),
            Phase::Ending { ending, remaining_ms } => {
                let remaining_ms = remaining_ms.saturating_sub(elapsed_ms);
                self.phase = Phase::Ending { ending, remaining_ms };
                if remaining_ms == 0 {
                    self.outcome = Some(match ending {
                        Ending::Win => SessionOutcome::Won,
                        Ending::Lose => SessionOutcome::Lost,
                    });
                }
            }
        }
        cues
    }

    fn tick_watching(&mut self, elapsed_ms: u64, cues: &mut Vec<Cue>) {
        let step = match self.watching.as_mut() {
            Some(w) => w.advance(elapsed_ms),
            None => WatchingStep::Finished,
        };
        match step {
            WatchingStep::Counting => {}
            WatchingStep::NextFloor(floor) => {
                self.current_floor = floor;
                cues.push(Cue::FloorSwitch);
            }
            WatchingStep::Finished => self.begin_playing(),
        }
    }

    fn begin_playing(&mut self) {
        self.level.set_all_visible(false);
        self.level.reset_player();
        self.current_floor = self.level.player_floor();
        self.phase = Phase::Playing;
        log::info!("watching over, playing from floor {}", self.current_floor);
    }

    fn tick_playing(&mut self, elapsed_ms: u64, cues: &mut Vec<Cue>) {
        if let Some(done) = self.scheduler.tick(elapsed_ms, &mut self.level) {
            self.finish_animation(done, cues);
            if matches!(self.phase, Phase::Ending { .. }) {
                return;
            }
        }

        let ticked = self.playing.advance(elapsed_ms);
        if ticked > 0 && self.playing.is_expired() {
            match self.mode {
                SessionMode::Serie => {
                    cues.push(Cue::TimeOver);
                    self.end(Ending::Lose, cues);
                }
                SessionMode::EditorTest => log::debug!("test session playing time exhausted"),
            }
        }
    }

    /// Commit a finished animation. A floor change lands the player and
    /// resolves the landing cell like any other entered cell; landing on
    /// stairs or an elevator does not chain another floor change.
    fn finish_animation(&mut self, done: AnimationRequest, cues: &mut Vec<Cue>) {
        let Some(to) = done.target_floor() else {
            log::debug!("{:?} finished on floor {}", done.kind(), done.floor());
            return;
        };
        let Some(landing) = self.level.geometry().on_floor(self.level.player(), to) else {
            log::warn!("floor change to missing floor {to} dropped");
            return;
        };
        self.current_floor = to;
        self.level.set_player(landing);
        self.level.set_visible(landing, true);
        log::debug!("floor change {} -> {}", done.floor(), to);

        let entered = self.level.kind_at(landing);
        if entered.is_floor_link() {
            return;
        }
        let resolution = effect::resolve(&mut self.counters, &self.level, entered);
        self.apply_resolution(resolution, cues);
    }

    fn end(&mut self, ending: Ending, cues: &mut Vec<Cue>) {
        cues.push(match ending {
            Ending::Win => Cue::LevelWon,
            Ending::Lose => Cue::LevelLost,
        });
        if ending == Ending::Win && self.mode == SessionMode::EditorTest {
            log::info!("test run reached arrival; back to editor");
            self.outcome = Some(SessionOutcome::ReturnToEditor);
            return;
        }
        log::info!("session ending: {:?}", ending);
        self.phase = Phase::Ending { ending, remaining_ms: self.end_screen_ms };
    }
}
