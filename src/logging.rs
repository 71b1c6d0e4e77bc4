/// Log setup.
///
/// The terminal is in raw mode while playing, so records go to a file.
/// `RUST_LOG` overrides the configured level.

use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Open (truncate) `path` and route the `log` facade into it.
/// Call once, before the terminal switches to raw mode.
pub fn init(path: &Path, default_level: &str) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    log::info!("logging to {}", path.display());
    Ok(())
}
