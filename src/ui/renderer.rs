/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The map itself comes from `sim::frame::build_draw_list`: each tile is
/// a `tile_w`-column strip starting at its diamond's left vertex. With
/// the default 4×2 tiles, neighbouring cells sit 2 columns and 1 row
/// apart, so the strips interlock into a staggered isometric floor.
///
/// Screen layout:
///   row 0        HUD (score, lives, coins, time, fps)
///   rows 2..h-2  map, centered on the player
///   row h-1      message / key help

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::ViewConfig;
use crate::domain::iso::Projection;
use crate::domain::tile::TileKind;
use crate::sim::frame::{build_draw_list, DrawCmd, Layer};
use crate::sim::world::{GameState, Outcome};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every empty cell, also used for Clear, so
    /// the gaps between rows never show the terminal's own default.
    const BASE_BG: Color = Color::Rgb { r: 14, g: 16, b: 24 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never equal to a real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    /// Signed coordinates: map strips may start off-screen.
    fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Overwrite glyph and foreground, keep the background underneath.
    fn overlay(&mut self, x: i32, y: i32, ch: char, fg: Color) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let cell = &mut self.cells[y as usize * self.width + x as usize];
            cell.ch = ch;
            cell.fg = fg;
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set((x + i) as i32, y as i32, Cell::new(ch, fg, bg));
        }
    }
}

// ── Palette ──

fn tile_look(kind: TileKind, tick: u64) -> (char, Color, Color) {
    match kind {
        TileKind::Grass => ('"', Color::Rgb { r: 90, g: 170, b: 70 }, Color::Rgb { r: 40, g: 100, b: 40 }),
        TileKind::Path => ('.', Color::Rgb { r: 190, g: 160, b: 110 }, Color::Rgb { r: 120, g: 95, b: 60 }),
        TileKind::Rock => ('#', Color::Rgb { r: 150, g: 150, b: 150 }, Color::Rgb { r: 80, g: 80, b: 85 }),
        TileKind::Water => ('~', Color::Rgb { r: 150, g: 200, b: 255 }, Color::Rgb { r: 30, g: 70, b: 160 }),
        TileKind::Gate => ('|', Color::Rgb { r: 230, g: 200, b: 90 }, Color::Rgb { r: 100, g: 60, b: 30 }),
        TileKind::Portal => ('@', Color::Rgb { r: 240, g: 160, b: 255 }, Color::Rgb { r: 90, g: 30, b: 130 }),
        TileKind::Dug => (',', Color::Rgb { r: 150, g: 110, b: 70 }, Color::Rgb { r: 85, g: 60, b: 35 }),
        TileKind::Unknown => ('?', Color::Magenta, Color::Black),
        TileKind::Lava => {
            let bright = (tick / 12) % 2 == 0;
            let g = if bright { 90 } else { 50 };
            ('≈', Color::Rgb { r: 255, g: 200, b: 80 }, Color::Rgb { r: 200, g, b: 20 })
        }
    }
}

/// Warning color for the HUD when the player stands on a hazard.
fn hazard_tint(kind: TileKind) -> Option<Color> {
    kind.is_hazard().then_some(Color::Rgb { r: 255, g: 80, b: 40 })
}

fn arrow(dir_row: u32) -> char {
    const ARROWS: [char; 8] = ['↑', '↖', '←', '↙', '↓', '↘', '→', '↗'];
    ARROWS.get(dir_row as usize).copied().unwrap_or('?')
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Frames drawn; drives lava shimmer and overlay blink.
    tick: u64,
    last_outcome: Outcome,
    /// Terminal reports key releases (kitty keyboard protocol).
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            tick: 0,
            last_outcome: Outcome::Playing,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.key_release = true;
        }
        tracing::debug!("key release events: {}", self.key_release);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn reports_key_release(&self) -> bool {
        self.key_release
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, state: &GameState, view: &ViewConfig, fps: f32) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Restart: repaint everything once.
        if state.outcome != self.last_outcome {
            self.back.cells.fill(Cell::INVALID);
            self.last_outcome = state.outcome;
        }

        self.tick = self.tick.wrapping_add(1);
        self.compose(state, view, fps);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn compose(&mut self, state: &GameState, view: &ViewConfig, fps: f32) {
        self.front.clear();

        let map_h = self.front.height.saturating_sub(MAP_ROW + 1);
        let mut proj = Projection::centered(
            self.front.width as f32, map_h as f32, view.tile_w, view.tile_h,
        );
        proj.center.y += MAP_ROW as f32;

        for cmd in build_draw_list(state, &proj) {
            self.draw(&cmd, view);
        }
        // Map strips spill over the HUD gap; repaint it.
        for y in 0..MAP_ROW {
            for x in 0..self.front.width {
                self.front.set(x as i32, y as i32, Cell::BLANK);
            }
        }

        self.compose_hud(state, fps);
        self.compose_footer(state);
        match state.outcome {
            Outcome::Won => self.compose_banner("★  YOU WIN!  ★", Color::Rgb { r: 255, g: 220, b: 60 }),
            Outcome::Lost => self.compose_banner("✕  GAME OVER  ✕", Color::Rgb { r: 255, g: 70, b: 70 }),
            Outcome::Playing if state.paused => {
                if (self.tick / 20) % 2 == 0 {
                    self.compose_banner("▶  PAUSED  ◀", Color::Rgb { r: 120, g: 200, b: 255 });
                }
            }
            Outcome::Playing => {}
        }
    }

    fn draw(&mut self, cmd: &DrawCmd, view: &ViewConfig) {
        let x = cmd.pos.x.floor() as i32;
        let y = cmd.pos.y.floor() as i32;
        match cmd.layer {
            Layer::Tile(id) => {
                let kind = TileKind::from_id(id);
                let (ch, fg, bg) = tile_look(kind, self.tick);
                for dx in 0..view.tile_w.round().max(1.0) as i32 {
                    let glyph = if dx % 2 == 0 { ch } else { ' ' };
                    self.front.set(x + dx, y, Cell::new(glyph, fg, bg));
                }
            }
            Layer::Coin => {
                let gold = Color::Rgb { r: 255, g: 215, b: 0 };
                self.front.overlay(x - 1, y, '(', gold);
                self.front.overlay(x, y, '$', gold);
            }
            Layer::Effect => {
                let tint = Color::Rgb { r: 255, g: 120, b: 40 };
                let reach = cmd.scale.round() as i32;
                for dx in -reach..reach {
                    self.front.overlay(x + dx, y, '*', tint);
                }
            }
            Layer::Player => {
                let (col, row) = cmd.region;
                let body = if col % 2 == 0 { Color::White } else { Color::Rgb { r: 200, g: 230, b: 255 } };
                let heading = Color::Rgb { r: 120, g: 255, b: 140 };
                let (glyph_x, arrow_x) = if cmd.flip_x { (x, x - 1) } else { (x - 1, x) };
                self.front.overlay(glyph_x, y, '☺', body);
                self.front.overlay(arrow_x, y, arrow(row), heading);
            }
        }
    }

    fn compose_hud(&mut self, s: &GameState, fps: f32) {
        let hearts: String = "♥".repeat(s.lives as usize);
        let secs = s.display_clock();
        let hud = format!(
            " SCORE {:>5}   LIVES {:<6}  COINS {}/{}   TIME {:02}:{:04.1}   {:>3.0} fps",
            s.score,
            hearts,
            s.coins.collected(),
            s.coins.total(),
            (secs / 60.0).floor() as u64,
            secs % 60.0,
            fps,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, Cell::BASE_BG);
        if let Some(tint) = hazard_tint(TileKind::from_id(s.logical_tile(s.player.pos).unwrap_or_default())) {
            self.front.put_str(0, HUD_ROW + 1, " HOT!", tint, Cell::BASE_BG);
        }
    }

    fn compose_footer(&mut self, s: &GameState) {
        let row = self.front.height.saturating_sub(1);
        let (text, fg) = if !s.message.is_empty() {
            (s.message.clone(), Color::Rgb { r: 255, g: 220, b: 50 })
        } else {
            (
                " W/Q/A/Z/S/C/D/E move   P pause   R restart   ESC quit".to_string(),
                Color::DarkGrey,
            )
        };
        self.front.put_str(0, row, &text, fg, Cell::BASE_BG);
    }

    fn compose_banner(&mut self, title: &str, color: Color) {
        let panel = Color::Rgb { r: 30, g: 30, b: 40 };
        let lines = [
            title.to_string(),
            String::new(),
            "ENTER / R  play again".to_string(),
            "ESC        quit".to_string(),
        ];
        let box_w = 30_usize.min(self.front.width);
        let box_h = lines.len() + 2;
        let x0 = self.front.width.saturating_sub(box_w) / 2;
        let y0 = self.front.height.saturating_sub(box_h) / 2;
        for y in y0..y0 + box_h {
            for x in x0..x0 + box_w {
                self.front.set(x as i32, y as i32, Cell::new(' ', Color::White, panel));
            }
        }
        for (i, line) in lines.iter().enumerate() {
            let len = line.chars().count();
            let x = x0 + box_w.saturating_sub(len) / 2;
            let fg = if i == 0 { color } else { Color::Rgb { r: 180, g: 180, b: 180 } };
            self.front.put_str(x, y0 + 1 + i, line, fg, panel);
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::Direction;
    use crate::domain::grid::GridPos;

    fn composed(state: &GameState) -> Renderer {
        let mut r = Renderer::new();
        r.front.resize(80, 24);
        r.compose(state, &GameConfig::default().view, 60.0);
        r
    }

    fn row_text(r: &Renderer, y: usize) -> String {
        (0..r.front.width).map(|x| r.front.get(x, y).ch).collect()
    }

    #[test]
    fn player_is_drawn_at_the_map_center() {
        let state = GameState::new(&GameConfig::default());
        let r = composed(&state);
        // map area is rows 2..23, center (40, 2 + 10)
        let y = MAP_ROW + (24 - MAP_ROW - 1) / 2;
        let row = row_text(&r, y);
        assert!(row.contains('☺'), "row {y}: {row:?}");
        assert!(row.contains(arrow(Direction::SouthWest.sprite_row())));
    }

    #[test]
    fn hud_reports_score_and_coins() {
        let mut state = GameState::new(&GameConfig::default());
        state.score = 20;
        let r = composed(&state);
        let hud = row_text(&r, HUD_ROW);
        assert!(hud.contains("SCORE    20"), "{hud:?}");
        assert!(hud.contains("COINS 0/2"), "{hud:?}");
    }

    #[test]
    fn lost_shows_banner() {
        let mut state = GameState::new(&GameConfig::default());
        state.outcome = Outcome::Lost;
        let r = composed(&state);
        assert!((0..24).any(|y| row_text(&r, y).contains("GAME OVER")));
    }

    #[test]
    fn coins_are_drawn() {
        let mut state = GameState::new(&GameConfig::default());
        state.player.pos = GridPos::new(5, 2);
        let r = composed(&state);
        assert!((0..24).any(|y| row_text(&r, y).contains("($")));
    }
}
