/// Presentation layer: double-buffered, diff-based terminal renderer.
///
///   1. Compose the next frame into `front` (one `Glyph` per terminal column)
///   2. Compare with `back` (previous frame)
///   3. Queue commands only for glyphs that changed, flush once
///   4. Swap front/back
///
/// Each arena cell is two terminal columns wide so the grid looks square.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Intelligence;
use crate::domain::grid::Cell;
use crate::domain::tile::{CellKind, PowerUp};
use crate::sim::world::{Phase, WorldState};

const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const DANGER_BG: Color = Color::Rgb { r: 70, g: 25, b: 25 };
const BLOCK_FG: Color = Color::Rgb { r: 170, g: 110, b: 50 };

/// Fuse seconds below which a bomb blinks.
const FUSE_WARNING: f32 = 0.75;

#[derive(Clone, Copy, PartialEq, Eq)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: BASE_BG };
    /// Differs from every real glyph; forces a full repaint.
    const INVALID: Glyph = Glyph { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    glyphs: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(width: usize, height: usize) -> Self {
        FrameBuffer { width, height, glyphs: vec![Glyph::BLANK; width * height] }
    }

    fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            *self = FrameBuffer::new(width, height);
        }
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
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }

    /// Centre `s` on row `y`.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Renderer ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const STATUS_ROW: usize = 1;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    last_phase: Option<Phase>,
    /// Tint cells in the AI's danger snapshot.
    pub show_danger: bool,
    frame: u64,
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            last_phase: None,
            show_danger: false,
            frame: 0,
            keyboard_enhanced: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns true when the
    /// terminal reports key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }
        self.sync_size()?;
        Ok(self.keyboard_enhanced)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        self.frame = self.frame.wrapping_add(1);
        self.sync_size()?;

        if self.last_phase != Some(world.phase) {
            self.invalidate()?;
            self.last_phase = Some(world.phase);
        }

        self.front.glyphs.fill(Glyph::BLANK);
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::GameOver => {
                self.compose_arena(world);
                self.compose_banner(world, "GAME OVER", "Enter: new game   Esc: title");
            }
            Phase::GameComplete => {
                self.compose_arena(world);
                self.compose_banner(world, "ALL STAGES CLEAR", "Enter / Esc: title");
            }
            Phase::LevelIntro => {
                self.compose_arena(world);
                self.compose_banner(world, &world.level_name, "get ready");
            }
            Phase::Playing | Phase::Dying | Phase::LevelComplete => self.compose_arena(world),
        }
        if world.paused {
            self.compose_banner(world, "PAUSED", "F1: resume");
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn sync_size(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if tw != self.front.width || th != self.front.height {
            self.front.resize(tw, th);
            self.back.resize(tw, th);
            self.invalidate()?;
        }
        Ok(())
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.glyphs.fill(Glyph::INVALID);
        queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let glyph = self.front.get(x, y);
                if glyph == self.back.get(x, y) { continue; }

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

    // ── Compose ──

    fn compose_title(&mut self, w: &WorldState) {
        let mid = self.front.height / 2;
        self.front.put_centered(mid.saturating_sub(3), "B L A S T   A R E N A", Color::Yellow, BASE_BG);
        self.front.put_centered(mid.saturating_sub(1), "Clear every enemy, then find the exit.", Color::Grey, BASE_BG);
        self.front.put_centered(mid + 1, "Enter: start    Q / Esc: quit", Color::White, BASE_BG);
        if !w.message.is_empty() {
            self.front.put_centered(mid + 3, &w.message, Color::Black, MSG_BG);
        }
    }

    fn compose_arena(&mut self, w: &WorldState) {
        let p = &w.player;
        let hud = format!(
            " Stage {}/{}  Score {:<7}  Lives {}  Bombs {}  Fire {}  Enemies {} ",
            w.current_level + 1, w.total_levels.max(1), w.score, w.lives,
            p.bomb_capacity, p.bomb_range, w.enemies_alive(),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let exit = match w.grid.cells_of_type(CellKind::Exit).next() {
            Some(cell) if w.enemies_alive() == 0 => format!("EXIT OPEN at {},{}", cell.x(), cell.y()),
            Some(_) => "EXIT found".to_string(),
            None => "EXIT hidden".to_string(),
        };
        let mut status = format!(" Blocks {:<3} {exit}", w.grid.count_cells(CellKind::Block));
        if self.show_danger {
            status.push_str(&format!("  Danger {}", w.danger.len()));
        }
        self.front.put_str(0, STATUS_ROW, &status, Color::Grey, BASE_BG);

        for cell in w.grid.cells() {
            let (a, b) = self.cell_glyphs(w, cell);
            let col = cell.x() * CELL_W;
            let row = MAP_ROW + cell.y();
            self.front.set(col, row, a);
            self.front.set(col + 1, row, b);
        }

        let below = MAP_ROW + w.grid.height() + 1;
        if !w.message.is_empty() {
            self.front.fill_row(below, MSG_BG);
            self.front.put_str(1, below, &w.message, Color::Black, MSG_BG);
        }
        let help = " Arrows/WASD: move  Space/Z: bomb  F1: pause  F2: danger  Esc: title";
        self.front.put_str(0, below + 2, help, Color::DarkGrey, BASE_BG);
    }

    /// Two-column glyph pair for one arena cell, topmost layer first:
    /// player, enemy, flame, bomb, power-up, terrain.
    fn cell_glyphs(&self, w: &WorldState, cell: &Cell) -> (Glyph, Glyph) {
        let (x, y) = cell.pos();
        let bg = if self.show_danger && w.danger.contains(x, y) { DANGER_BG } else { BASE_BG };
        let pair = |s: [char; 2], fg: Color, bg: Color| (Glyph::new(s[0], fg, bg), Glyph::new(s[1], fg, bg));

        if w.player.x == x && w.player.y == y {
            let fg = if w.player.alive { Color::White } else { Color::Red };
            return pair(['<', '>'], fg, Color::Blue);
        }
        if let Some(e) = w.enemy_at(x, y) {
            let (face, fg) = match e.intelligence {
                Intelligence::Low => (['o', 'o'], Color::Magenta),
                Intelligence::Normal => (['O', 'O'], Color::Red),
                Intelligence::High => (['@', '@'], Color::DarkRed),
            };
            let fg = if e.can_pass_walls { Color::Grey } else { fg };
            return pair(face, fg, bg);
        }
        if cell.is_burning() {
            return pair(['*', '*'], Color::Yellow, Color::Red);
        }
        if let Some(bomb) = cell.bomb.and_then(|id| w.grid.bomb(id)) {
            let blink = bomb.fuse < FUSE_WARNING && (self.frame / 4) % 2 == 0;
            let fg = if blink { Color::Red } else { Color::White };
            return pair(['(', ')'], fg, bg);
        }
        if let Some(pu) = cell.power_up {
            return pair([power_up_letter(pu), '+'], Color::Cyan, bg);
        }
        match cell.kind {
            CellKind::Wall => pair(['█', '█'], Color::DarkGrey, BASE_BG),
            CellKind::Block if cell.is_crumbling() => pair(['░', '░'], BLOCK_FG, bg),
            CellKind::Block => pair(['▒', '▒'], BLOCK_FG, bg),
            CellKind::Exit => pair(['[', ']'], Color::Green, bg),
            CellKind::Empty => pair([' ', ' '], Color::White, bg),
        }
    }

    fn compose_banner(&mut self, w: &WorldState, title: &str, hint: &str) {
        let row = MAP_ROW + w.grid.height() / 2;
        let width = title.chars().count().max(hint.chars().count()) + 4;
        let pad = |s: &str| format!("{:^width$}", s);
        self.front.put_centered_in(row.saturating_sub(1), &pad(""), w.grid.width() * CELL_W);
        self.front.put_centered_in(row, &pad(title), w.grid.width() * CELL_W);
        self.front.put_centered_in(row + 1, &pad(hint), w.grid.width() * CELL_W);
    }
}

impl FrameBuffer {
    /// Banner text centred over the arena (first `span` columns).
    fn put_centered_in(&mut self, y: usize, s: &str, span: usize) {
        let len = s.chars().count();
        let x = span.saturating_sub(len) / 2;
        self.put_str(x, y, s, Color::Black, MSG_BG);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn power_up_letter(pu: PowerUp) -> char {
    match pu {
        PowerUp::ExtraBomb => 'B',
        PowerUp::Fire => 'F',
        PowerUp::Speed => 'S',
        PowerUp::WallPass => 'W',
        PowerUp::BombPass => 'P',
        PowerUp::FlamePass => 'X',
    }
}
