/// Editor test hand-off.
///
/// The grid has exactly one owner at a time:
///
///   EditorBench ──start_test()──► TestRun (session owns the grid,
///        ▲                                  run keeps the pre-test backup)
///        └──────────finish()──────────┘
///
/// Whatever the test session did to the grid (emptied stars, mirrored
/// floors) is dropped with it; the editor gets its backup back.

use crate::domain::grid::Level;
use super::session::{GameSession, SessionMode, SessionOutcome, SessionSetup};

/// Editor-side owner of a level between test runs.
#[derive(Clone, Debug)]
pub struct EditorBench {
    level: Level,
}

impl EditorBench {
    pub fn new(level: Level) -> Self {
        EditorBench { level }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    #[allow(dead_code)]
    pub fn into_level(self) -> Level {
        self.level
    }

    /// Hand the grid to a test-mode session.
    pub fn start_test(self, setup: SessionSetup) -> TestRun {
        let backup = self.level.clone();
        log::info!("editor test started");
        TestRun {
            session: GameSession::new(self.level, SessionMode::EditorTest, setup),
            backup,
        }
    }
}

pub struct TestRun {
    session: GameSession,
    backup: Level,
}

impl TestRun {
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.session.outcome()
    }

    /// Drop the session and give the editor its pre-test grid back.
    pub fn finish(self) -> EditorBench {
        log::info!("editor test finished: {:?}", self.session.outcome());
        EditorBench { level: self.backup }
    }
}
