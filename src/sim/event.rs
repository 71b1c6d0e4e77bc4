/// Cues emitted by the session.
/// The presentation layer consumes these for sound and transient visuals;
/// the session never waits on them.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Cue {
    StarFound,
    Collision,
    FloorSwitch,
    LifeGained,
    LifeLost,
    TimeGained,
    TimeLost,
    BoardTransform,
    Light,
    TimeOver,
    LevelWon,
    LevelLost,
}

impl Cue {
    pub const ALL: [Cue; 12] = [
        Cue::StarFound,
        Cue::Collision,
        Cue::FloorSwitch,
        Cue::LifeGained,
        Cue::LifeLost,
        Cue::TimeGained,
        Cue::TimeLost,
        Cue::BoardTransform,
        Cue::Light,
        Cue::TimeOver,
        Cue::LevelWon,
        Cue::LevelLost,
    ];

    /// Stable identifier for logs and the status line.
    pub fn name(self) -> &'static str {
        match self {
            Cue::StarFound => "star found",
            Cue::Collision => "collision",
            Cue::FloorSwitch => "floor switch",
            Cue::LifeGained => "life gained",
            Cue::LifeLost => "life lost",
            Cue::TimeGained => "time gained",
            Cue::TimeLost => "time lost",
            Cue::BoardTransform => "board transform",
            Cue::Light => "light",
            Cue::TimeOver => "time over",
            Cue::LevelWon => "level won",
            Cue::LevelLost => "level lost",
        }
    }
}
