/// Keyboard input.
///
/// Every Press/Repeat event becomes at most one `Command`; there is no
/// held-key state because each key press is exactly one step on the grid.
/// Release events (reported by some terminals) are ignored.
///
///   Arrows / WASD / HJKL  →  Move
///   Esc                   →  Escape (abort session / back)
///   Enter / Space         →  Confirm
///   Q / Ctrl+C            →  Quit

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::address::Direction;

/// What the player asked for this frame, in arrival order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    Escape,
    Confirm,
    Quit,
}

pub struct InputState {
    commands: Vec<Command>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { commands: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.commands.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    if let Some(cmd) = map_key(&key) {
                        self.commands.push(cmd);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("terminal read failed: {e}");
                    break;
                }
            }
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Append commands from another source (gamepad).
    pub fn extend(&mut self, more: impl IntoIterator<Item = Command>) {
        self.commands.extend(more);
    }
}

fn map_key(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
            _ => None,
        };
    }
    let cmd = match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Char('k') => Command::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('j') => Command::Move(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('h') => Command::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('l') => Command::Move(Direction::Right),
        KeyCode::Esc => Command::Escape,
        KeyCode::Enter | KeyCode::Char(' ') => Command::Confirm,
        KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}
