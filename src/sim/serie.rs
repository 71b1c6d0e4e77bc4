/// Serie loading and serie progression.
///
/// ## Sources (priority order):
///   1. A file named on the command line (`--serie`)
///   2. `series/` directory (`*.txt` files, sorted by file name)
///   3. Built-in embedded serie
///
/// ## Serie format (`.txt`):
///   ```
///   ## Serie Name
///   @ watching 5
///   ---
///   # Level Name
///   <rows of floor 0>
///
///   <rows of floor 1>
///   ---
///   # Next Level
///   <rows>
///   ```
///
/// Levels are separated by a line containing only `---`.
/// Header lines (`## name`, `@ watching N`) come before the first `---`.
/// A level name line is `# ` (hash, space, text); grid rows never contain
/// spaces, so a wall row like `####` is never mistaken for a name.
/// Blank lines separate floors. Every floor of a level must have the same
/// rows x columns; rows are handed to `Level::from_characters` in order.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::address::Geometry;
use crate::domain::grid::{Level, LevelLoadError};
use super::session::{GameSession, SessionMode, SessionOutcome, SessionSetup};

const EMBEDDED_SERIE: &str = include_str!("../../series/tutorial.txt");

#[derive(Debug, Error)]
pub enum SerieError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serie contains no levels")]
    NoLevels,
    #[error("bad header line {0:?}")]
    BadHeader(String),
    #[error("level {level}: floor {floor} row {row} has {actual} cells, expected {expected}")]
    RaggedRow { level: usize, floor: usize, row: usize, expected: usize, actual: usize },
    #[error("level {level}: floor {floor} has {actual} rows, expected {expected}")]
    RaggedFloor { level: usize, floor: usize, expected: usize, actual: usize },
    #[error("level {level}: {source}")]
    Level {
        level: usize,
        #[source]
        source: LevelLoadError,
    },
}

#[derive(Clone, Debug)]
pub struct SerieLevel {
    pub name: String,
    pub level: Level,
}

#[derive(Clone, Debug)]
pub struct Serie {
    pub name: String,
    /// Per-floor watching time set by the serie (overrides config).
    pub watching_time: Option<u32>,
    pub levels: Vec<SerieLevel>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub fn load_serie(path: &Path) -> Result<Serie, SerieError> {
    let text = std::fs::read_to_string(path).map_err(|source| SerieError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut serie = parse_serie(&text)?;
    if serie.name.is_empty() {
        serie.name = path.file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
    }
    log::info!("loaded serie {:?} ({} levels) from {}", serie.name, serie.levels.len(), path.display());
    Ok(serie)
}

/// `*.txt` files in `dir`, sorted. Missing directory = none.
pub fn scan_series(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            log::debug!("no series directory {}: {e}", dir.display());
            return vec![];
        }
    };
    let mut found: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |e| e == "txt"))
        .collect();
    found.sort();
    found
}

pub fn embedded_serie() -> Result<Serie, SerieError> {
    parse_serie(EMBEDDED_SERIE)
}

/// First loadable serie from `dir`, else the embedded one.
/// Broken files are logged and skipped.
pub fn default_serie(dir: &Path) -> Result<Serie, SerieError> {
    for path in scan_series(dir) {
        match load_serie(&path) {
            Ok(serie) => return Ok(serie),
            Err(e) => log::warn!("skipping {}: {e}", path.display()),
        }
    }
    embedded_serie()
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

pub fn parse_serie(text: &str) -> Result<Serie, SerieError> {
    let mut name = String::new();
    let mut watching_time = None;
    let mut sections: Vec<Vec<&str>> = vec![];
    let mut in_levels = false;

    for line in text.lines() {
        let line = line.trim_end();
        if line == "---" {
            sections.push(vec![]);
            in_levels = true;
            continue;
        }
        if !in_levels {
            parse_header_line(line, &mut name, &mut watching_time)?;
            continue;
        }
        if let Some(section) = sections.last_mut() {
            section.push(line);
        }
    }

    let mut levels = vec![];
    for section in sections {
        if section.iter().all(|l| l.is_empty()) {
            continue;
        }
        let number = levels.len() + 1;
        levels.push(parse_level(number, &section)?);
    }
    if levels.is_empty() {
        return Err(SerieError::NoLevels);
    }

    Ok(Serie { name, watching_time, levels })
}

fn parse_header_line(line: &str, name: &mut String, watching_time: &mut Option<u32>) -> Result<(), SerieError> {
    if line.is_empty() {
        return Ok(());
    }
    if let Some(rest) = line.strip_prefix("##") {
        if name.is_empty() {
            *name = rest.trim().to_string();
        }
        return Ok(());
    }
    if let Some(rest) = line.strip_prefix('@') {
        let mut words = rest.split_whitespace();
        return match (words.next(), words.next().map(str::parse::<u32>), words.next()) {
            (Some("watching"), Some(Ok(seconds)), None) => {
                *watching_time = Some(seconds);
                Ok(())
            }
            _ => Err(SerieError::BadHeader(line.to_string())),
        };
    }
    Err(SerieError::BadHeader(line.to_string()))
}

/// One `---` section: optional `# name`, then floors split by blank lines.
fn parse_level(number: usize, lines: &[&str]) -> Result<SerieLevel, SerieError> {
    let mut name = String::new();
    let mut floors: Vec<Vec<&str>> = vec![vec![]];

    for &line in lines {
        if let Some(rest) = line.strip_prefix("# ") {
            if name.is_empty() {
                name = rest.trim().to_string();
            }
        } else if line.is_empty() {
            if floors.last().map_or(false, |f| !f.is_empty()) {
                floors.push(vec![]);
            }
        } else if let Some(floor) = floors.last_mut() {
            floor.push(line);
        }
    }
    floors.retain(|f| !f.is_empty());

    let rows = floors.first().map_or(0, |f| f.len());
    let columns = floors.first().and_then(|f| f.first()).map_or(0, |r| r.chars().count());
    let mut chars = Vec::with_capacity(floors.len() * rows * columns);
    for (floor, floor_rows) in floors.iter().enumerate() {
        if floor_rows.len() != rows {
            return Err(SerieError::RaggedFloor { level: number, floor, expected: rows, actual: floor_rows.len() });
        }
        for (row, text) in floor_rows.iter().enumerate() {
            let width = text.chars().count();
            if width != columns {
                return Err(SerieError::RaggedRow { level: number, floor, row, expected: columns, actual: width });
            }
            chars.extend(text.chars());
        }
    }

    let level = Level::from_characters(Geometry::new(floors.len(), rows, columns), &chars)
        .map_err(|source| SerieError::Level { level: number, source })?;

    if name.is_empty() {
        name = format!("Level {number}");
    }
    Ok(SerieLevel { name, level })
}

// ══════════════════════════════════════════════════════════════
// Progression
// ══════════════════════════════════════════════════════════════

/// What happens after a serie session ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunProgress {
    NextLevel,
    SerieWon,
    GameOver,
    Quit,
}

/// A serie being played: level index plus the lives and watching budget
/// carried from one level to the next.
pub struct SerieRun {
    serie: Serie,
    index: usize,
    setup: SessionSetup,
}

impl SerieRun {
    pub fn new(serie: Serie, mut setup: SessionSetup) -> Self {
        if let Some(seconds) = serie.watching_time {
            setup.watching_time = seconds;
        }
        SerieRun { serie, index: 0, setup }
    }

    pub fn level_index(&self) -> usize {
        self.index
    }

    pub fn level_name(&self) -> &str {
        self.serie.levels.get(self.index).map_or("", |l| l.name.as_str())
    }

    /// Fresh session on the current level. None past the last level.
    pub fn start_level(&self) -> Option<GameSession> {
        let entry = self.serie.levels.get(self.index)?;
        log::info!("serie {:?}: level {} {:?}", self.serie.name, self.index + 1, entry.name);
        Some(GameSession::new(entry.level.clone(), SessionMode::Serie, self.setup))
    }

    /// Account for a finished session. None while the session is still running.
    pub fn finish(&mut self, session: &GameSession) -> Option<RunProgress> {
        let progress = match session.outcome()? {
            SessionOutcome::Won => {
                let counters = session.counters();
                self.setup.lives = counters.lives;
                self.setup.watching_time = counters.watching_time;
                self.index += 1;
                if self.index >= self.serie.levels.len() {
                    RunProgress::SerieWon
                } else {
                    RunProgress::NextLevel
                }
            }
            SessionOutcome::Lost => RunProgress::GameOver,
            SessionOutcome::Aborted => RunProgress::Quit,
            SessionOutcome::ReturnToEditor => {
                log::warn!("editor outcome in a serie session");
                RunProgress::Quit
            }
        };
        log::info!("serie {:?}: {:?}", self.serie.name, progress);
        Some(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::address::Direction;
    use crate::domain::cell::CellKind;
    use crate::sim::animation::AnimationTiming;

    const TWO_LEVELS: &str = "\
## Small
@ watching 2
---
# Corridor
D.A
---
# Tower
D*S
...

..s
..A
";

    fn setup() -> SessionSetup {
        SessionSetup {
            lives: 3,
            watching_time: 9,
            playing_time: 30,
            animation: AnimationTiming { transform_ms: 10, stairs_ms: 10 },
            end_screen_ms: 100,
        }
    }

    #[test]
    fn parses_header_levels_and_floors() {
        let serie = parse_serie(TWO_LEVELS).unwrap();
        assert_eq!(serie.name, "Small");
        assert_eq!(serie.watching_time, Some(2));
        assert_eq!(serie.levels.len(), 2);
        assert_eq!(serie.levels[0].name, "Corridor");
        assert_eq!(serie.levels[0].level.geometry(), Geometry::new(1, 1, 3));
        let tower = &serie.levels[1].level;
        assert_eq!(tower.geometry(), Geometry::new(2, 2, 3));
        assert_eq!(tower.total_stars(), 1);
        assert_eq!(tower.last_playable_floor(), 1);
    }

    #[test]
    fn wall_rows_are_not_names() {
        let serie = parse_serie("---\n####\n#DA#\n####\n").unwrap();
        assert_eq!(serie.levels[0].name, "Level 1");
        assert_eq!(serie.levels[0].level.geometry(), Geometry::new(1, 3, 4));
        assert_eq!(serie.name, "");
    }

    #[test]
    fn ragged_rows_and_floors_are_rejected() {
        let err = parse_serie("---\nD..\n.A\n").unwrap_err();
        assert!(matches!(err, SerieError::RaggedRow { level: 1, floor: 0, row: 1, expected: 3, actual: 2 }));

        let err = parse_serie("---\nD.\n.A\n\n..\n").unwrap_err();
        assert!(matches!(err, SerieError::RaggedFloor { level: 1, floor: 1, expected: 2, actual: 1 }));
    }

    #[test]
    fn grid_errors_carry_level_number() {
        let err = parse_serie("---\nD.A\n---\nD..\n").unwrap_err();
        match err {
            SerieError::Level { level, source } => {
                assert_eq!(level, 2);
                assert_eq!(source, LevelLoadError::MissingArrival);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_serie("---\nD?A\n"), Err(SerieError::Level { level: 1, .. })));
    }

    #[test]
    fn header_errors_and_empty_series() {
        assert!(matches!(parse_serie("@ watching soon\n---\nDA\n"), Err(SerieError::BadHeader(_))));
        assert!(matches!(parse_serie("stray\n---\nDA\n"), Err(SerieError::BadHeader(_))));
        assert!(matches!(parse_serie("## Nothing\n"), Err(SerieError::NoLevels)));
        assert!(matches!(parse_serie("---\n\n---\n"), Err(SerieError::NoLevels)));
    }

    #[test]
    fn embedded_serie_uses_standard_floors() {
        let serie = embedded_serie().unwrap();
        assert!(!serie.levels.is_empty());
        for entry in &serie.levels {
            let g = entry.level.geometry();
            assert_eq!(g, Geometry::standard(g.floors), "{}", entry.name);
            assert!(entry.level.total_stars() > 0);
        }
    }

    #[test]
    fn missing_directory_scans_empty() {
        assert!(scan_series(Path::new("/definitely/not/here")).is_empty());
        assert!(matches!(
            load_serie(Path::new("/definitely/not/here.txt")),
            Err(SerieError::Io { .. })
        ));
    }

    /// Play the watching period out, then follow `dirs`.
    fn play(session: &mut GameSession, dirs: &[Direction]) {
        for _ in 0..=session.level().last_playable_floor() {
            session.tick(60_000);
        }
        for &d in dirs {
            session.on_directional_input(d);
            session.tick(10);
        }
        session.tick(100);
    }

    #[test]
    fn run_carries_counters_and_reports_serie_won() {
        let mut run = SerieRun::new(parse_serie(TWO_LEVELS).unwrap(), setup());

        let mut first = run.start_level().unwrap();
        // serie header overrides the configured watching time
        assert_eq!(first.watching_time_remaining(), 2);
        assert_eq!(run.finish(&first), None);
        play(&mut first, &[Direction::Right, Direction::Right]);
        assert_eq!(run.finish(&first), Some(RunProgress::NextLevel));
        assert_eq!(run.level_index(), 1);
        assert_eq!(run.level_name(), "Tower");

        let mut second = run.start_level().unwrap();
        // star, stairs up (lands on 1,0,2), down onto arrival
        play(&mut second, &[Direction::Right, Direction::Right, Direction::Down]);
        assert_eq!(second.level().kind_at(second.level().player()), CellKind::Arrival);
        assert_eq!(run.finish(&second), Some(RunProgress::SerieWon));
        assert!(run.start_level().is_none());
    }

    #[test]
    fn lost_and_aborted_sessions_stop_the_run() {
        let mut run = SerieRun::new(parse_serie(TWO_LEVELS).unwrap(), setup());
        let mut session = run.start_level().unwrap();
        session.on_escape();
        assert_eq!(run.finish(&session), Some(RunProgress::Quit));

        let mut session = run.start_level().unwrap();
        session.tick(2000);
        session.tick(31_000);
        session.tick(100);
        assert_eq!(run.finish(&session), Some(RunProgress::GameOver));
        assert_eq!(run.level_index(), 0);
    }
}
