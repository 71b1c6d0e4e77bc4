/// Entry point and game loop.
///
///   Title ──Enter──► Session ──won──► Session (next level) ──last──► SerieWon
///     ▲                 │ lost / Esc                                     │
///     └── GameOver ◄────┘                                                │
///     └──────────────────────────────────────────────────────────────────┘
///
/// `--test FILE` skips the serie flow and runs one level in editor test
/// mode, returning to a summary screen that can restart the test.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;

use config::GameConfig;
use sim::event::Cue;
use sim::handoff::{EditorBench, TestRun};
use sim::serie::{default_serie, load_serie, RunProgress, Serie, SerieRun};
use sim::session::{GameSession, SessionOutcome, SessionSetup};
use ui::gamepad::GamepadState;
use ui::input::{Command, InputState};
use ui::renderer::{Renderer, Screen};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const MESSAGE_MS: u64 = 1200;

#[derive(Parser, Debug)]
#[command(name = "memomaze", version, about = "Memo Maze: memorize the maze, then walk it blind")]
struct Args {
    /// Serie file to play instead of the series directory
    #[arg(long, value_name = "FILE")]
    serie: Option<PathBuf>,

    /// Run one level of FILE in editor test mode
    #[arg(long, value_name = "FILE", conflicts_with = "serie")]
    test: Option<PathBuf>,

    /// Level to test (1-based)
    #[arg(long, default_value_t = 1, requires = "test")]
    level: usize,

    /// Log filter, overrides config.toml
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

fn main() {
    let args = Args::parse();
    let config = GameConfig::load();

    let filter = args.log_level.as_deref().unwrap_or(&config.log_level);
    if let Err(e) = logging::init(&config.log_file, filter) {
        eprintln!("Warning: cannot open log file {}: {e}", config.log_file.display());
    }

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = match &args.test {
        Some(path) => test_loop(path, args.level, &mut renderer, sound.as_ref(), &config),
        None => serie_loop(args.serie.as_deref(), &mut renderer, sound.as_ref(), &config),
    };

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game error: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Memo Maze!");
}

// ── Shared frame plumbing ──

/// Keyboard and gamepad merged into one per-frame command list.
struct Controls {
    kb: InputState,
    gp: GamepadState,
}

impl Controls {
    fn new(config: &GameConfig) -> Self {
        let mut gp = GamepadState::new();
        gp.load_button_config(&config.gamepad);
        if gp.connected {
            log::info!("gamepad detected");
        }
        Controls { kb: InputState::new(), gp }
    }

    fn poll(&mut self) -> Vec<Command> {
        self.kb.drain_events();
        self.kb.extend(self.gp.update().iter().copied());
        self.kb.commands().to_vec()
    }
}

/// Fixed-rate tick source reporting real elapsed milliseconds.
struct Ticker {
    rate: Duration,
    last: Instant,
}

impl Ticker {
    fn new(rate_ms: u64) -> Self {
        Ticker { rate: Duration::from_millis(rate_ms), last: Instant::now() }
    }

    fn due(&mut self) -> Option<u64> {
        let elapsed = self.last.elapsed();
        if elapsed < self.rate {
            return None;
        }
        self.last = Instant::now();
        Some(elapsed.as_millis() as u64)
    }
}

/// Name of the last cue, shown on the status line for a moment.
#[derive(Default)]
struct Message {
    text: &'static str,
    remaining_ms: u64,
}

impl Message {
    fn tick(&mut self, elapsed_ms: u64) {
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
        if self.remaining_ms == 0 {
            self.text = "";
        }
    }
}

fn process_cues(sound: Option<&SoundEngine>, cues: &[Cue], message: &mut Message) {
    for &cue in cues {
        log::debug!("cue: {}", cue.name());
        if let Some(sfx) = sound {
            sfx.play(cue);
        }
        message.text = cue.name();
        message.remaining_ms = MESSAGE_MS;
    }
}

/// Feed one frame of commands and the elapsed tick (if any) into a session.
fn drive_session(
    session: &mut GameSession,
    commands: &[Command],
    elapsed_ms: Option<u64>,
    sound: Option<&SoundEngine>,
    message: &mut Message,
) {
    for &cmd in commands {
        match cmd {
            Command::Move(dir) => {
                let cues = session.on_directional_input(dir);
                process_cues(sound, &cues, message);
            }
            Command::Escape => {
                if session.on_escape().is_none() {
                    log::debug!("escape ignored in {:?}", session.state());
                }
            }
            Command::Confirm | Command::Quit => {}
        }
    }
    if let Some(elapsed_ms) = elapsed_ms {
        let cues = session.tick(elapsed_ms);
        message.tick(elapsed_ms);
        process_cues(sound, &cues, message);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Serie mode
// ═══════════════════════════════════════════════════════════════

struct Play {
    run: SerieRun,
    session: GameSession,
    message: Message,
}

enum Phase {
    Title,
    Playing(Box<Play>),
    GameOver { level_number: usize },
    SerieWon,
    LoadError(String),
}

fn serie_loop(
    serie_path: Option<&Path>,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = match serie_path {
        Some(path) => load_serie(path),
        None => default_serie(&config.series_dir),
    };
    let (serie, mut phase) = match loaded {
        Ok(serie) => {
            log::info!("serie {:?} with {} levels", serie.name, serie.levels.len());
            (Some(serie), Phase::Title)
        }
        Err(e) => {
            log::error!("cannot load serie: {e}");
            (None, Phase::LoadError(e.to_string()))
        }
    };

    let setup = config.session_setup();
    let mut controls = Controls::new(config);
    let mut ticker = Ticker::new(config.timing.tick_rate_ms);

    loop {
        let commands = controls.poll();
        if commands.contains(&Command::Quit) {
            break;
        }
        // Consumed every frame; sessions only see their own time
        let elapsed_ms = ticker.due();

        phase = match phase {
            Phase::Title => match &serie {
                Some(serie) if commands.contains(&Command::Confirm) => start_serie(serie, setup),
                _ if commands.contains(&Command::Escape) => break,
                _ => Phase::Title,
            },
            Phase::Playing(mut play) => {
                drive_session(&mut play.session, &commands, elapsed_ms, sound, &mut play.message);
                advance(play)
            }
            Phase::GameOver { level_number } => {
                if commands.iter().any(|c| matches!(c, Command::Confirm | Command::Escape)) {
                    Phase::Title
                } else {
                    Phase::GameOver { level_number }
                }
            }
            Phase::SerieWon => {
                if commands.iter().any(|c| matches!(c, Command::Confirm | Command::Escape)) {
                    Phase::Title
                } else {
                    Phase::SerieWon
                }
            }
            Phase::LoadError(message) => {
                if commands.iter().any(|c| matches!(c, Command::Confirm | Command::Escape)) {
                    break;
                }
                Phase::LoadError(message)
            }
        };

        renderer.render(&serie_screen(&phase, serie.as_ref()))?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn start_serie(serie: &Serie, setup: SessionSetup) -> Phase {
    let run = SerieRun::new(serie.clone(), setup);
    match run.start_level() {
        Some(session) => Phase::Playing(Box::new(Play { run, session, message: Message::default() })),
        None => Phase::SerieWon,
    }
}

/// Move on once the session has an outcome.
fn advance(mut play: Box<Play>) -> Phase {
    let level_number = play.run.level_index() + 1;
    match play.run.finish(&play.session) {
        None => Phase::Playing(play),
        Some(RunProgress::NextLevel) => match play.run.start_level() {
            Some(session) => {
                play.session = session;
                play.message = Message::default();
                Phase::Playing(play)
            }
            None => Phase::SerieWon,
        },
        Some(RunProgress::SerieWon) => Phase::SerieWon,
        Some(RunProgress::GameOver) => Phase::GameOver { level_number },
        Some(RunProgress::Quit) => Phase::Title,
    }
}

fn serie_screen<'a>(phase: &'a Phase, serie: Option<&'a Serie>) -> Screen<'a> {
    let serie_name = serie.map_or("", |s| s.name.as_str());
    let level_count = serie.map_or(0, |s| s.levels.len());
    match phase {
        Phase::Title => Screen::Title { serie_name, level_count },
        Phase::Playing(play) => Screen::Session {
            snapshot: play.session.snapshot(),
            level_name: play.run.level_name(),
            level_number: play.run.level_index() + 1,
            message: play.message.text,
        },
        Phase::GameOver { level_number } => Screen::GameOver { serie_name, level_number: *level_number },
        Phase::SerieWon => Screen::SerieWon { serie_name, level_count },
        Phase::LoadError(message) => Screen::LoadError { message: message.as_str() },
    }
}

// ═══════════════════════════════════════════════════════════════
//  Editor test mode
// ═══════════════════════════════════════════════════════════════

enum TestPhase {
    Running { run: TestRun, message: Message },
    Finished { bench: EditorBench, outcome: SessionOutcome },
    LoadError(String),
}

fn load_test_bench(path: &Path, level: usize) -> Result<(String, EditorBench), String> {
    let serie = load_serie(path).map_err(|e| e.to_string())?;
    let count = serie.levels.len();
    let entry = level
        .checked_sub(1)
        .and_then(|i| serie.levels.into_iter().nth(i))
        .ok_or_else(|| format!("{}: no level {level} (serie has {count})", path.display()))?;
    Ok((entry.name, EditorBench::new(entry.level)))
}

fn test_loop(
    path: &Path,
    level: usize,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let setup = config.session_setup();
    let (level_name, mut phase) = match load_test_bench(path, level) {
        Ok((name, bench)) => {
            let run = bench.start_test(setup);
            (name, TestPhase::Running { run, message: Message::default() })
        }
        Err(e) => {
            log::error!("cannot load test level: {e}");
            (String::new(), TestPhase::LoadError(e))
        }
    };

    let mut controls = Controls::new(config);
    let mut ticker = Ticker::new(config.timing.tick_rate_ms);

    loop {
        let commands = controls.poll();
        if commands.contains(&Command::Quit) {
            break;
        }
        // Consumed every frame; sessions only see their own time
        let elapsed_ms = ticker.due();

        phase = match phase {
            TestPhase::Running { mut run, mut message } => {
                drive_session(run.session_mut(), &commands, elapsed_ms, sound, &mut message);
                match run.outcome() {
                    Some(outcome) => TestPhase::Finished { bench: run.finish(), outcome },
                    None => TestPhase::Running { run, message },
                }
            }
            TestPhase::Finished { bench, outcome } => {
                if commands.contains(&Command::Confirm) {
                    log::info!("restarting test of {} cells", bench.level().cells().len());
                    TestPhase::Running { run: bench.start_test(setup), message: Message::default() }
                } else if commands.contains(&Command::Escape) {
                    break;
                } else {
                    TestPhase::Finished { bench, outcome }
                }
            }
            TestPhase::LoadError(message) => {
                if commands.iter().any(|c| matches!(c, Command::Confirm | Command::Escape)) {
                    break;
                }
                TestPhase::LoadError(message)
            }
        };

        let screen = match &phase {
            TestPhase::Running { run, message } => Screen::Session {
                snapshot: run.session().snapshot(),
                level_name: level_name.as_str(),
                level_number: level,
                message: message.text,
            },
            TestPhase::Finished { outcome, .. } => Screen::TestFinished { outcome: *outcome },
            TestPhase::LoadError(message) => Screen::LoadError { message: message.as_str() },
        };
        renderer.render(&screen)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
