/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// ```toml
/// [timing]
/// tick_rate_ms = 50
/// transform_ms = 600
/// stairs_ms = 400
/// end_screen_ms = 2500
///
/// [session]
/// lives = 3
/// playing_time = 90     # seconds, 0 = no limit
/// watching_time = 5     # seconds per floor (a serie may override)
///
/// [gamepad]
/// confirm = ["A", "Start"]
/// cancel = ["B", "Select"]
///
/// [general]
/// series_dir = "series"
/// log_file = "memomaze.log"
/// log_level = "info"
/// ```

use serde::Deserialize;
use std::path::PathBuf;

use crate::sim::animation::AnimationTiming;
use crate::sim::session::SessionSetup;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub session: SessionConfig,
    pub gamepad: GamepadConfig,
    pub series_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub transform_ms: u64,
    pub stairs_ms: u64,
    pub end_screen_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub lives: u32,
    pub playing_time: u32,
    pub watching_time: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl GameConfig {
    /// Session parameters handed to every new `GameSession`.
    pub fn session_setup(&self) -> SessionSetup {
        SessionSetup {
            lives: self.session.lives,
            watching_time: self.session.watching_time,
            playing_time: self.session.playing_time,
            animation: AnimationTiming {
                transform_ms: self.timing.transform_ms,
                stairs_ms: self.timing.stairs_ms,
            },
            end_screen_ms: self.timing.end_screen_ms,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    session: TomlSession,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_transform")]
    transform_ms: u64,
    #[serde(default = "default_stairs")]
    stairs_ms: u64,
    #[serde(default = "default_end_screen")]
    end_screen_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_playing_time")]
    playing_time: u32,
    #[serde(default = "default_watching_time")]
    watching_time: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_series_dir")]
    series_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 50 }
fn default_transform() -> u64 { 600 }
fn default_stairs() -> u64 { 400 }
fn default_end_screen() -> u64 { 2500 }

fn default_lives() -> u32 { 3 }
fn default_playing_time() -> u32 { 90 }
fn default_watching_time() -> u32 { 5 }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }

fn default_series_dir() -> String { "series".into() }
fn default_log_file() -> String { "memomaze.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            transform_ms: default_transform(),
            stairs_ms: default_stairs(),
            end_screen_ms: default_end_screen(),
        }
    }
}

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            lives: default_lives(),
            playing_time: default_playing_time(),
            watching_time: default_watching_time(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            series_dir: default_series_dir(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no directory search for `series_dir`).
    #[cfg(test)]
    fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(toml_cfg, &[]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Series directory: absolute, else the first candidate dir that has it
        let series_dir_str = &toml_cfg.general.series_dir;
        let series_dir = if PathBuf::from(series_dir_str).is_absolute() {
            PathBuf::from(series_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(series_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(series_dir_str))
        };

        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
                transform_ms: toml_cfg.timing.transform_ms,
                stairs_ms: toml_cfg.timing.stairs_ms,
                end_screen_ms: toml_cfg.timing.end_screen_ms,
            },
            session: SessionConfig {
                lives: toml_cfg.session.lives,
                playing_time: toml_cfg.session.playing_time,
                watching_time: toml_cfg.session.watching_time,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            series_dir,
            log_file: PathBuf::from(toml_cfg.general.log_file),
            log_level: toml_cfg.general.log_level,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // Resolve symlinks so an installed link still finds data next to the binary
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Runs before logging is set up, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.timing, TimingConfig {
            tick_rate_ms: 50,
            transform_ms: 600,
            stairs_ms: 400,
            end_screen_ms: 2500,
        });
        assert_eq!(cfg.session, SessionConfig { lives: 3, playing_time: 90, watching_time: 5 });
        assert_eq!(cfg.gamepad.confirm, vec!["A", "Start"]);
        assert_eq!(cfg.series_dir, PathBuf::from("series"));
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str("[session]\nlives = 7\n\n[timing]\nstairs_ms = 0\n").unwrap();
        assert_eq!(cfg.session.lives, 7);
        assert_eq!(cfg.session.watching_time, 5);
        assert_eq!(cfg.timing.stairs_ms, 0);
        assert_eq!(cfg.timing.transform_ms, 600);
    }

    #[test]
    fn session_setup_mirrors_config() {
        let cfg = GameConfig::from_toml_str(
            "[session]\nplaying_time = 0\nwatching_time = 8\n[timing]\ntransform_ms = 100\nend_screen_ms = 5\n",
        ).unwrap();
        let setup = cfg.session_setup();
        assert_eq!(setup.playing_time, 0);
        assert_eq!(setup.watching_time, 8);
        assert_eq!(setup.animation.transform_ms, 100);
        assert_eq!(setup.end_screen_ms, 5);
    }

    #[test]
    fn absolute_series_dir_is_kept_and_tick_rate_is_positive() {
        let cfg = GameConfig::from_toml_str("[general]\nseries_dir = \"/srv/series\"\n[timing]\ntick_rate_ms = 0\n").unwrap();
        assert_eq!(cfg.series_dir, PathBuf::from("/srv/series"));
        assert_eq!(cfg.timing.tick_rate_ms, 1);
    }

    #[test]
    fn wrong_types_are_errors() {
        assert!(GameConfig::from_toml_str("[session]\nlives = \"many\"\n").is_err());
    }
}
