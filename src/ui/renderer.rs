/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Glyph)
///   2. Compare each glyph with `back` buffer (previous frame)
///   3. Only emit terminal commands for glyphs that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Everything drawn comes from a `Screen`; the renderer never touches
/// session state.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::CellKind;
use crate::domain::effect::Ending;
use crate::domain::transform::AnimationKind;
use crate::sim::session::{SessionMode, SessionOutcome, SessionState, Snapshot};

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit dark background for every terminal cell, so the gaps between
    /// rows match the cells on terminals that paint them separately.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    glyphs: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, glyphs: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.glyphs = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.glyphs.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, glyph: Glyph) {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x] = glyph;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }
}

// ── What to draw ──

/// One frame's worth of content, assembled by the driver.
pub enum Screen<'a> {
    Title { serie_name: &'a str, level_count: usize },
    Session {
        snapshot: Snapshot<'a>,
        level_name: &'a str,
        level_number: usize,
        message: &'a str,
    },
    GameOver { serie_name: &'a str, level_number: usize },
    SerieWon { serie_name: &'a str, level_count: usize },
    TestFinished { outcome: SessionOutcome },
    LoadError { message: &'a str },
}

// ── Cell visuals ──

const HIDDEN: (char, char, Color, Color) = ('░', '░', Color::Rgb { r: 60, g: 60, b: 80 }, Color::Reset);
const PLAYER: (char, char, Color, Color) = ('(', ')', Color::Black, Color::Rgb { r: 255, g: 220, b: 50 });

/// Two terminal columns per grid cell.
fn cell_visual(kind: CellKind) -> (char, char, Color, Color) {
    let gold = Color::Rgb { r: 255, g: 200, b: 50 };
    let green = Color::Rgb { r: 80, g: 255, b: 80 };
    let red = Color::Rgb { r: 255, g: 80, b: 80 };
    let cyan = Color::Rgb { r: 100, g: 200, b: 255 };
    let violet = Color::Rgb { r: 190, g: 120, b: 255 };
    match kind {
        CellKind::Wall => ('█', '█', Color::Rgb { r: 120, g: 120, b: 120 }, Color::Rgb { r: 70, g: 70, b: 70 }),
        CellKind::Empty => (' ', ' ', Color::Reset, Color::Reset),
        CellKind::Departure => ('▶', ' ', green, Color::Reset),
        CellKind::Arrival => ('⚑', ' ', green, Color::Reset),
        CellKind::Star => ('★', ' ', gold, Color::Reset),
        CellKind::MoreLife => ('♥', '+', red, Color::Reset),
        CellKind::LessLife => ('♥', '-', red, Color::Reset),
        CellKind::MoreTime => ('⌛', '+', cyan, Color::Reset),
        CellKind::LessTime => ('⌛', '-', cyan, Color::Reset),
        CellKind::StairsUp => ('▲', ' ', Color::White, Color::Reset),
        CellKind::StairsDown => ('▼', ' ', Color::White, Color::Reset),
        CellKind::ElevatorUp => ('⇑', ' ', Color::White, Color::Reset),
        CellKind::ElevatorDown => ('⇓', ' ', Color::White, Color::Reset),
        CellKind::HorizontalMirror => ('↔', ' ', violet, Color::Reset),
        CellKind::VerticalMirror => ('↕', ' ', violet, Color::Reset),
        CellKind::Diagonal => ('⤡', ' ', violet, Color::Reset),
        CellKind::RotateLeft => ('↺', ' ', violet, Color::Reset),
        CellKind::RotateRight => ('↻', ' ', violet, Color::Reset),
        CellKind::QuarterRotation => ('⟳', ' ', violet, Color::Reset),
        CellKind::Light => ('☀', ' ', gold, Color::Reset),
    }
}

fn animation_label(kind: AnimationKind) -> &'static str {
    match kind {
        AnimationKind::HorizontalMirror => "mirror ↔",
        AnimationKind::VerticalMirror => "mirror ↕",
        AnimationKind::Diagonal => "diagonal",
        AnimationKind::RotateLeft => "rotate ↺",
        AnimationKind::RotateRight => "rotate ↻",
        AnimationKind::QuarterRotation => "quarters ⟳",
        AnimationKind::StairsUp => "floor ▲",
        AnimationKind::StairsDown => "floor ▼",
    }
}

/// Dashboard text: floor, stars, lives, watching time, playing time.
fn dashboard(s: &Snapshot<'_>) -> String {
    let floors = s.geometry.floors;
    let mut line = format!(
        " Floor {}/{}  ★ {}/{}  ♥ {}  Watch {}s  Time {}s",
        s.current_floor + 1,
        floors,
        s.found_stars,
        s.total_stars,
        s.lives,
        s.watching_time,
        s.playing_time_remaining,
    );
    if s.mode == SessionMode::EditorTest {
        line.push_str("  [TEST]");
    }
    line
}

fn status_line(s: &Snapshot<'_>) -> String {
    match s.state {
        SessionState::Watching => format!(
            " MEMORIZE floor {}: {}s left",
            s.current_floor + 1,
            s.watching_time_remaining,
        ),
        SessionState::Playing => String::new(),
        SessionState::AnimationBlocked => match &s.animation {
            Some(a) => {
                let filled = (a.progress() * 10.0).round() as usize;
                format!(
                    " {} [{}{}]",
                    animation_label(a.request.kind()),
                    "▓".repeat(filled),
                    "░".repeat(10 - filled.min(10)),
                )
            }
            None => String::new(),
        },
        SessionState::Ending(Ending::Win) => " ★ LEVEL CLEARED ★".to_string(),
        SessionState::Ending(Ending::Lose) => " ✕ LEVEL LOST ✕".to_string(),
    }
}

// ── Renderer ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const STATUS_ROW: usize = 1;
const MAP_ROW: usize = 3;
const MAP_COL: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<u8>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame
        self.back.glyphs.fill(Glyph::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, screen: &Screen<'_>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.glyphs.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → clear for a clean transition
        let kind = screen.id();
        if self.last_screen != Some(kind) {
            self.back.glyphs.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(kind);
        }

        self.front.clear();
        match screen {
            Screen::Title { serie_name, level_count } => self.compose_title(serie_name, *level_count),
            Screen::Session { snapshot, level_name, level_number, message } => {
                self.compose_session(snapshot, level_name, *level_number, message)
            }
            Screen::GameOver { serie_name, level_number } => self.compose_game_over(serie_name, *level_number),
            Screen::SerieWon { serie_name, level_count } => self.compose_serie_won(serie_name, *level_count),
            Screen::TestFinished { outcome } => self.compose_test_finished(*outcome),
            Screen::LoadError { message } => self.compose_load_error(message),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the terminal default
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Glyph::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let glyph = self.front.get(x, y);
                if glyph == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if glyph.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(glyph.fg))?;
                    last_fg = glyph.fg;
                }
                if glyph.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(glyph.bg))?;
                    last_bg = glyph.bg;
                }
                queue!(self.writer, Print(glyph.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_session(&mut self, s: &Snapshot<'_>, level_name: &str, level_number: usize, message: &str) {
        let hud_bg = Color::Rgb { r: 40, g: 40, b: 70 };
        self.front.fill_row(HUD_ROW, hud_bg);
        let hud = format!(" {}. {} │{}", level_number, level_name, dashboard(s));
        self.front.put_str(0, HUD_ROW, &hud, Color::White, hud_bg);

        let status = status_line(s);
        let status_fg = match s.state {
            SessionState::Ending(Ending::Lose) => Color::Rgb { r: 255, g: 80, b: 80 },
            SessionState::Ending(Ending::Win) => Color::Rgb { r: 80, g: 255, b: 80 },
            _ => Color::Rgb { r: 255, g: 220, b: 50 },
        };
        self.front.put_str(0, STATUS_ROW, &status, status_fg, Color::Reset);

        let g = s.geometry;
        let per_floor = g.cells_per_floor();
        let start = s.current_floor * per_floor;
        let floor_cells = s.cells.get(start..start + per_floor).unwrap_or(&[]);
        let player_here = s.geometry.locate(s.player).0 == s.current_floor;
        let player_index = s.player.0.checked_sub(start);

        for (i, cell) in floor_cells.iter().enumerate() {
            let col = MAP_COL + cell.column * CELL_W;
            let row = MAP_ROW + cell.row;
            let (c0, c1, fg, bg) = if player_here && player_index == Some(i) {
                PLAYER
            } else if cell.visible {
                cell_visual(cell.kind)
            } else {
                HIDDEN
            };
            self.front.set(col, row, Glyph::new(c0, fg, bg));
            self.front.set(col + 1, row, Glyph::new(c1, fg, bg));
        }

        let footer = MAP_ROW + g.rows + 1;
        if !message.is_empty() {
            self.front.put_str(MAP_COL, footer, &format!("◈ {message}"), Color::Rgb { r: 200, g: 180, b: 50 }, Color::Reset);
        }
        let help = match s.mode {
            SessionMode::Serie => "←→↑↓ / WASD Move   ESC Main menu",
            SessionMode::EditorTest => "←→↑↓ / WASD Move   ESC Back to editor",
        };
        self.front.put_str(MAP_COL, footer + 1, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_title(&mut self, serie_name: &str, level_count: usize) {
        let title = [
            r"  __  __                        __  __                 ",
            r" |  \/  | ___ _ __ ___   ___   |  \/  | __ _ _______  ",
            r" | |\/| |/ _ \ '_ ` _ \ / _ \  | |\/| |/ _` |_  / _ \ ",
            r" |_|  |_|\___|_| |_| |_|\___/  |_|  |_|\__,_|/__\___| ",
        ];
        let gold = Color::Rgb { r: 255, g: 200, b: 50 };
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, gold, Color::Reset);
        }
        self.front.put_str(6, 7, "memorize every floor, then walk it blind", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);

        let info = format!("Serie: {serie_name}  ({level_count} levels)");
        self.front.put_str(8, 10, &info, Color::White, Color::Reset);
        self.front.put_str(8, 12, "ENTER   Play serie", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.put_str(8, 13, "  Q     Quit", Color::White, Color::Reset);

        let legend = [
            "▶ departure  ⚑ arrival (after every ★)  ▲▼ stairs  ⇑⇓ elevator",
            "♥± lives  ⌛± watching time  ↔↕⤡↺↻⟳ board transforms  ☀ light",
        ];
        for (i, line) in legend.iter().enumerate() {
            self.front.put_str(4, 16 + i, line, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_game_over(&mut self, serie_name: &str, level_number: usize) {
        let red = Color::Rgb { r: 255, g: 60, b: 60 };
        self.front.put_str(6, 4, "╔══════════════════════════╗", red, Color::Reset);
        self.front.put_str(6, 5, "║     ✕  GAME  OVER  ✕     ║", red, Color::Reset);
        self.front.put_str(6, 6, "╚══════════════════════════╝", red, Color::Reset);
        let reached = format!("◈ {serie_name}: reached level {level_number}");
        self.front.put_str(8, 9, &reached, Color::White, Color::Reset);
        self.front.put_str(8, 11, "▸ ENTER / ESC: Back to Title", Color::DarkGrey, Color::Reset);
    }

    fn compose_serie_won(&mut self, serie_name: &str, level_count: usize) {
        let gold = Color::Rgb { r: 255, g: 220, b: 50 };
        self.front.put_str(4, 4, "╔══════════════════════════════╗", gold, Color::Reset);
        self.front.put_str(4, 5, "║    ★  SERIE  COMPLETE!  ★    ║", gold, Color::Reset);
        self.front.put_str(4, 6, "╚══════════════════════════════╝", gold, Color::Reset);
        let done = format!("◈ {serie_name}: all {level_count} levels cleared");
        self.front.put_str(6, 9, &done, Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.put_str(6, 11, "▸ ENTER / ESC: Back to Title", Color::DarkGrey, Color::Reset);
    }

    fn compose_test_finished(&mut self, outcome: SessionOutcome) {
        let text = match outcome {
            SessionOutcome::ReturnToEditor | SessionOutcome::Won => "Arrival reached: level is solvable.",
            SessionOutcome::Lost => "Test run lost.",
            SessionOutcome::Aborted => "Test run aborted.",
        };
        self.front.put_str(4, 4, "TEST RUN FINISHED", Color::Rgb { r: 100, g: 200, b: 255 }, Color::Reset);
        self.front.put_str(4, 6, text, Color::White, Color::Reset);
        self.front.put_str(4, 8, "▸ ENTER: test again   ESC / Q: Quit", Color::DarkGrey, Color::Reset);
    }

    fn compose_load_error(&mut self, message: &str) {
        let red = Color::Rgb { r: 255, g: 80, b: 80 };
        self.front.put_str(4, 3, "Could not load level data", red, Color::Reset);
        let width = self.front.width.saturating_sub(8).max(20);
        let chars: Vec<char> = message.chars().collect();
        for (i, chunk) in chars.chunks(width).enumerate() {
            let line: String = chunk.iter().collect();
            self.front.put_str(4, 5 + i, &line, Color::White, Color::Reset);
        }
        self.front.put_str(4, 7 + chars.len() / width, "▸ ESC / Q: Quit", Color::DarkGrey, Color::Reset);
    }
}

impl Screen<'_> {
    /// Stable per-variant id; a change forces a full repaint.
    fn id(&self) -> u8 {
        match self {
            Screen::Title { .. } => 0,
            Screen::Session { .. } => 1,
            Screen::GameOver { .. } => 2,
            Screen::SerieWon { .. } => 3,
            Screen::TestFinished { .. } => 4,
            Screen::LoadError { .. } => 5,
        }
    }
}
