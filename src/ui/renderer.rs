/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Paint the next frame into the `front` buffer
///   2. Compare each cell with `back` (the previous frame)
///   3. Queue terminal commands only for cells that changed, flush once
///   4. Swap front/back
///
/// Entities are painted back to front in z order, so the hit test and the
/// picture agree on what is on top. One tile is two terminal columns.
///
/// Screen layout:
///   row 0          status line (+ flags on the right)
///   row 2..        map viewport
///   below map +1   notice bar (while a notice is up)
///   below map +3   help line

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::ViewConfig;
use crate::domain::entity::{ControlKind, Entity, EntityKind, GrassVariant, MoveDir};
use crate::domain::grid::{Vec2, TILE_SIZE};
use crate::sim::world::{Camera, DoorState, WorldState};

// ── ScreenCell: the unit of the frame buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct ScreenCell {
    ch: [u8; 8],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool, // occupies 2 terminal columns
    cont: bool, // right half of a wide char, never printed
}

impl ScreenCell {
    /// Every empty cell gets this explicit background so row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 24 };

    const BLANK: ScreenCell = ScreenCell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: ScreenCell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: ScreenCell = ScreenCell {
        ch: [0; 8],
        ch_len: 0,
        fg: Color::White,
        bg: ScreenCell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Differs from every real cell: forces a full repaint.
    const INVALID: ScreenCell = ScreenCell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn narrow(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn wide(c: char, bg: Color) -> Self {
        let mut cell = Self::narrow(c, Color::Reset, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of ScreenCells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<ScreenCell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![ScreenCell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![ScreenCell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(ScreenCell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: ScreenCell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> ScreenCell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            ScreenCell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, ScreenCell::narrow(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, ScreenCell::narrow(' ', Color::White, bg));
        }
    }
}

// ── Tile looks ──

/// How one tile is drawn: either two narrow glyphs or one wide emoji.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Look {
    Pair(char, char, Color, Color),
    Emoji(char, Color),
}

const GRASS_BG: Color = Color::Rgb { r: 24, g: 60, b: 28 };
const FLOOR_BG: Color = Color::Rgb { r: 62, g: 52, b: 44 };
const WALL_FG: Color = Color::Rgb { r: 140, g: 140, b: 150 };
const WALL_BG: Color = Color::Rgb { r: 70, g: 70, b: 80 };
const BUTTON_BG: Color = Color::Rgb { r: 40, g: 60, b: 110 };
const SUMMON_BG: Color = Color::Rgb { r: 110, g: 40, b: 120 };
const GOLEM_FG: Color = Color::Rgb { r: 190, g: 180, b: 160 };

const SUMMON_LABEL: [char; 6] = ['S', 'U', 'M', 'M', 'O', 'N'];

/// Scale an RGB colour toward black by `alpha`.
fn dim(c: Color, alpha: f32) -> Color {
    match c {
        Color::Rgb { r, g, b } => {
            let a = alpha.clamp(0.0, 1.0);
            Color::Rgb {
                r: (r as f32 * a) as u8,
                g: (g as f32 * a) as u8,
                b: (b as f32 * a) as u8,
            }
        }
        other => other,
    }
}

/// Look of tile `part` (0-based, left to right) of an entity.
fn look_for(e: &Entity, door: DoorState, part: usize) -> Look {
    match e.kind {
        EntityKind::Grass(GrassVariant::Grass1) => {
            Look::Pair('"', ' ', Color::Rgb { r: 70, g: 140, b: 70 }, GRASS_BG)
        }
        EntityKind::Grass(GrassVariant::Grass2) => {
            Look::Pair(' ', ',', Color::Rgb { r: 90, g: 160, b: 80 }, GRASS_BG)
        }
        EntityKind::Floor => Look::Pair('·', ' ', Color::Rgb { r: 90, g: 78, b: 66 }, FLOOR_BG),
        EntityKind::Wall => Look::Pair('█', '█', WALL_FG, WALL_BG),
        EntityKind::Door => match door {
            DoorState::Open => Look::Pair('▐', ' ', Color::Rgb { r: 150, g: 100, b: 50 }, FLOOR_BG),
            DoorState::Locked | DoorState::Unlocking => Look::Emoji('🚪', WALL_BG),
        },
        EntityKind::Key => Look::Emoji('🔑', FLOOR_BG),
        EntityKind::Bed => Look::Pair('▄', '▄', Color::Rgb { r: 180, g: 60, b: 60 }, FLOOR_BG),
        EntityKind::Bookshelf => Look::Emoji('📚', FLOOR_BG),
        EntityKind::Player => Look::Emoji('🧙', Color::Reset),
        EntityKind::Golem => Look::Pair('▟', '▙', dim(GOLEM_FG, e.alpha), Color::Reset),
        EntityKind::Control(ControlKind::Move(dir)) => {
            let arrow = match dir {
                MoveDir::Up => '▲',
                MoveDir::Down => '▼',
                MoveDir::Left => '◀',
                MoveDir::Right => '▶',
            };
            Look::Pair(arrow, ' ', dim(Color::Rgb { r: 220, g: 220, b: 255 }, e.alpha), BUTTON_BG)
        }
        EntityKind::Control(ControlKind::SummonGolem) => {
            let i = (part * 2).min(SUMMON_LABEL.len() - 2);
            Look::Pair(SUMMON_LABEL[i], SUMMON_LABEL[i + 1], dim(Color::White, e.alpha), SUMMON_BG)
        }
    }
}

/// Map a terminal cell to a world point, if it falls on the map viewport.
pub fn screen_point(cam: &Camera, col: u16, row: u16) -> Option<Vec2> {
    let (col, row) = (col as usize, row as usize);
    if row < MAP_ROW {
        return None;
    }
    let row = row - MAP_ROW;
    if col >= cam.screen_cols() || row >= cam.screen_rows() {
        return None;
    }
    Some(cam.screen_to_world(col, row))
}

// ── Renderer ──

const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, notice + help below it.
const RESERVED_ROWS: usize = MAP_ROW + 4;

const HUD_BG: Color = Color::Rgb { r: 30, g: 24, b: 60 };
const NOTICE_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    view: ViewConfig,
    frame: u64,
    gamepad: bool,
}

impl Renderer {
    pub fn new(view: &ViewConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            view: view.clone(),
            frame: 0,
            gamepad: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(ScreenCell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize_buffers(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize_buffers(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(ScreenCell::INVALID);
    }

    /// Shown in the HUD next to the session flags.
    pub fn set_gamepad_connected(&mut self, connected: bool) {
        self.gamepad = connected;
    }

    /// Force a full repaint on the next frame.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(ScreenCell::INVALID);
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize_buffers(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(ScreenCell::BASE_BG), Clear(ClearType::All))?;
        }

        self.frame = self.frame.wrapping_add(1);
        self.compose(world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Fit the camera to the terminal and paint the whole frame.
    fn compose(&mut self, world: &mut WorldState) {
        let max_tiles_w = self.term_w / CELL_W;
        let max_tiles_h = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
        world.camera.fit(&self.view, max_tiles_w, max_tiles_h);

        self.front.clear();
        self.compose_hud(world);
        self.compose_map(world);
        self.compose_footer(world);
        if world.paused {
            self.compose_pause_overlay(world);
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = ScreenCell::BASE_BG;
        // Where the cursor will be after the last print, if known.
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(ScreenCell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    x += 1;
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
                queue!(self.writer, Print(cell.as_str()))?;

                x += if cell.wide { 2 } else { 1 };
                cursor_at = Some((x, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &WorldState) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(1, HUD_ROW, &w.status, Color::White, HUD_BG);

        let key = if w.flags.has_key { "KEY ✓" } else { "KEY ·" };
        let door = match w.door_state() {
            DoorState::Locked => "DOOR locked",
            DoorState::Unlocking => "DOOR ...",
            DoorState::Open => "DOOR open",
        };
        let pad = if self.gamepad { "  PAD" } else { "" };
        let flags = format!("{key}  {door}{pad} ");
        let x = self.front.width.saturating_sub(flags.chars().count());
        self.front.put_str(x, HUD_ROW, &flags, Color::Rgb { r: 180, g: 180, b: 220 }, HUD_BG);
    }

    fn compose_map(&mut self, w: &WorldState) {
        let door = w.door_state();
        let mut visible: Vec<&Entity> = w.registry.iter().filter(|e| e.is_visible()).collect();
        visible.sort_by(|a, b| a.z.total_cmp(&b.z).then(a.id.cmp(&b.id)));

        for e in visible {
            let tiles_w = (e.size.x / TILE_SIZE).round().max(1.0) as usize;
            let tiles_h = (e.size.y / TILE_SIZE).round().max(1.0) as usize;
            let min = e.bounds().min;

            for ty in 0..tiles_h {
                for tx in 0..tiles_w {
                    let p = Vec2::new(
                        min.x + (tx as f32 + 0.5) * TILE_SIZE,
                        min.y + (ty as f32 + 0.5) * TILE_SIZE,
                    );
                    if let Some((sx, sy)) = w.camera.world_to_screen(p) {
                        let col = sx - sx % CELL_W;
                        self.paint(col, MAP_ROW + sy, look_for(e, door, tx));
                    }
                }
            }
        }
    }

    fn paint(&mut self, col: usize, row: usize, look: Look) {
        // A background-less look keeps whatever is underneath.
        let under = self.front.get(col, row).bg;
        let bg = |c: Color| if c == Color::Reset { under } else { c };

        match look {
            Look::Pair(c0, c1, fg, b) => {
                self.front.set(col, row, ScreenCell::narrow(c0, fg, bg(b)));
                self.front.set(col + 1, row, ScreenCell::narrow(c1, fg, bg(b)));
            }
            Look::Emoji(ch, b) => {
                self.front.set(col, row, ScreenCell::wide(ch, bg(b)));
                self.front.set(col + 1, row, ScreenCell::WIDE_CONT);
            }
        }
    }

    fn compose_footer(&mut self, w: &WorldState) {
        let map_bottom = MAP_ROW + w.camera.screen_rows();

        let notice_row = map_bottom + 1;
        if !w.notice.is_empty() && notice_row < self.front.height {
            self.front.fill_row(notice_row, NOTICE_BG);
            self.front.put_str(1, notice_row, &format!("◈ {}", w.notice), Color::Black, NOTICE_BG);
        }

        let help_row = map_bottom + 3;
        if help_row < self.front.height {
            let help = " Arrows/WASD:Move  G:Summon  Click:Tap  F1:Pause  F2:New  Esc:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let box_bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let view_cols = w.camera.screen_cols();
        let view_rows = w.camera.screen_rows();
        let box_w = 26_usize.min(view_cols);
        let box_h = 7_usize.min(view_rows);
        let box_x = view_cols.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + view_rows.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, ScreenCell::narrow(' ', Color::White, box_bg));
            }
        }

        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };
        let blink = (self.frame / 15) % 2 == 0;
        let title = if blink { "▶ PAUSED ◀" } else { "  PAUSED  " };
        self.front.put_str(box_x + 8, box_y + 1, title, hdr, box_bg);
        self.front.put_str(box_x + 2, box_y + 3, "F1   Resume", key_c, box_bg);
        self.front.put_str(box_x + 2, box_y + 4, "F2   New session", key_c, box_bg);
        self.front.put_str(box_x + 2, box_y + 5, "Esc  Quit", key_c, box_bg);
    }
}
