/// WorldState: the complete state of a running session.
///
/// ## Ownership
///
/// Everything the game mutates lives here: the entity registry, the three
/// session flags, the running golem sequence and the HUD text. Components
/// receive `&mut WorldState`; nothing is global. A new session is a new
/// `WorldState` (see `new_session`).
///
/// ## Camera / Viewport
///
/// World coordinates and screen coordinates are separate:
///   - `camera`: fixed view centered on the room
///   - one tile = 2 terminal columns × 1 terminal row
///   - Renderer maps `screen(col, row)` ↔ world point through the camera,
///     and pointer input goes through the same mapping in reverse.

use rand::Rng;
use tracing::info;

use crate::config::{GameConfig, TimingConfig, ViewConfig};
use crate::domain::entity::{EntityId, EntityKind};
use crate::domain::grid::{room_size, world_to_cell, Cell, Rect, Vec2, TILE_SIZE};
use crate::domain::rules;
use super::builder;
use super::registry::Registry;
use super::sequence::GolemSequence;

pub const INITIAL_STATUS: &str = "Escape the Dungeon!";
pub const SPELL_STATUS: &str = "You read a forbidden spell...";
pub const SMASH_STATUS: &str = "The golem smashed the door!";

/// World units covered by one terminal column / row.
pub const COL_UNITS: f32 = TILE_SIZE / 2.0;
pub const ROW_UNITS: f32 = TILE_SIZE;

/// Session flags. Reset only by starting a new session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameFlags {
    /// Monotonic: never goes back to false within a session.
    pub has_key: bool,
    pub summon_unlocked: bool,
    pub golem_has_broken_door: bool,
}

/// Lock state of the door as seen by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorState {
    /// No key, door solid.
    Locked,
    /// Key held, door still solid; the next tick strips it.
    Unlocking,
    /// No solid door remains (unlocked, or smashed by the golem).
    Open,
}

/// Fixed camera: a viewport centered on the room.
///
/// `(view_w, view_h)` are in world units. The renderer shrinks them to fit
/// the terminal via `fit()`.
#[derive(Clone, Debug)]
pub struct Camera {
    pub center: Vec2,
    pub view_w: f32,
    pub view_h: f32,
}

impl Camera {
    pub fn new(view: &ViewConfig) -> Self {
        let mut cam = Camera {
            center: room_size().scale(0.5),
            view_w: 0.0,
            view_h: 0.0,
        };
        cam.fit(view, usize::MAX, usize::MAX);
        cam
    }

    /// Size the viewport to the configured view, capped by how many tiles
    /// the terminal can show. Width is kept to an even and height to an odd
    /// number of tiles so tile edges stay aligned with screen cells around
    /// the room center (5, 3.5 in tiles).
    pub fn fit(&mut self, view: &ViewConfig, max_tiles_w: usize, max_tiles_h: usize) {
        let want_w = (view.width / TILE_SIZE).round().max(2.0) as usize;
        let want_h = (view.height / TILE_SIZE).round().max(1.0) as usize;
        let mut tw = want_w.min(max_tiles_w).max(2);
        let mut th = want_h.min(max_tiles_h).max(1);
        if tw % 2 == 1 { tw -= 1; }
        if th % 2 == 0 { th -= 1; }
        self.view_w = tw as f32 * TILE_SIZE;
        self.view_h = th as f32 * TILE_SIZE;
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.view_w / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center.y + self.view_h / 2.0
    }

    /// Number of terminal columns / rows the viewport spans.
    pub fn screen_cols(&self) -> usize {
        (self.view_w / COL_UNITS) as usize
    }

    pub fn screen_rows(&self) -> usize {
        (self.view_h / ROW_UNITS) as usize
    }

    /// World point at the center of a screen cell (relative to the map origin).
    pub fn screen_to_world(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(
            self.left() + (col as f32 + 0.5) * COL_UNITS,
            self.top() - (row as f32 + 0.5) * ROW_UNITS,
        )
    }

    /// Screen cell showing a world point. Returns None if outside the view.
    pub fn world_to_screen(&self, p: Vec2) -> Option<(usize, usize)> {
        let col = ((p.x - self.left()) / COL_UNITS).floor();
        let row = ((self.top() - p.y) / ROW_UNITS).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col < self.screen_cols() && row < self.screen_rows() {
            Some((col, row))
        } else {
            None
        }
    }
}

pub struct WorldState {
    // ── Entities ──
    pub registry: Registry,
    pub player: EntityId,
    pub summon_button: EntityId,

    // ── Game tracking ──
    pub flags: GameFlags,
    pub sequence: Option<GolemSequence>,

    // ── Timing config ──
    pub timing: TimingConfig,

    // ── Meta ──
    pub tick: u64,
    pub paused: bool,

    // ── UI ──
    pub status: String,
    pub notice: String,
    pub notice_timer: u32,

    // ── Camera / Viewport ──
    pub camera: Camera,
}

// ── Construction ──

impl WorldState {
    /// Build a fresh session: new room, flags cleared.
    pub fn new_session<R: Rng>(config: &GameConfig, rng: &mut R) -> Self {
        let camera = Camera::new(&config.view);
        let mut registry = Registry::new();
        let layout = builder::build_world(&mut registry, &config.view, camera.center, rng);
        info!(entities = registry.len(), "session started");

        WorldState {
            registry,
            player: layout.player,
            summon_button: layout.summon_button,
            flags: GameFlags::default(),
            sequence: None,
            timing: config.timing.clone(),
            tick: 0,
            paused: false,
            status: INITIAL_STATUS.to_string(),
            notice: String::new(),
            notice_timer: 0,
            camera,
        }
    }

    pub fn set_notice(&mut self, msg: &str, duration: u32) {
        self.notice = msg.to_string();
        self.notice_timer = duration;
    }

    pub fn set_status(&mut self, msg: &str) {
        if self.status != msg {
            self.status = msg.to_string();
        }
    }
}

// ── Player / door queries ──

impl WorldState {
    pub fn player_pos(&self) -> Vec2 {
        self.registry.get(self.player).map(|e| e.pos).unwrap_or_default()
    }

    pub fn player_cell(&self) -> Cell {
        world_to_cell(self.player_pos())
    }

    pub fn player_bounds(&self) -> Rect {
        match self.registry.get(self.player) {
            Some(e) => e.bounds(),
            None => Rect::centered(Vec2::default(), Vec2::new(TILE_SIZE, TILE_SIZE)),
        }
    }

    /// MovementResolver entry point: can the player enter `target`?
    pub fn can_move(&self, target: Vec2) -> bool {
        rules::can_move(self.registry.at(target), self.flags.has_key)
    }

    /// Commit a move. Single-frame teleport, no interpolation.
    pub fn set_player_pos(&mut self, target: Vec2) {
        if let Some(p) = self.registry.get_mut(self.player) {
            p.pos = target;
        }
    }

    pub fn door_state(&self) -> DoorState {
        let solid_door = self.registry.with_kind(EntityKind::Door).any(|d| d.solid);
        match (solid_door, self.flags.has_key) {
            (false, _) => DoorState::Open,
            (true, false) => DoorState::Locked,
            (true, true) => DoorState::Unlocking,
        }
    }

    pub fn golem_present(&self) -> bool {
        self.registry.count(EntityKind::Golem) > 0
    }

    /// Reveal the summon action. Idempotent; the status text is reset on
    /// every call. Returns true only on the first unlock.
    pub fn reveal_summon(&mut self) -> bool {
        self.set_status(SPELL_STATUS);
        if let Some(btn) = self.registry.get_mut(self.summon_button) {
            btn.alpha = 1.0;
        }
        if self.flags.summon_unlocked {
            return false;
        }
        self.flags.summon_unlocked = true;
        info!("summon action unlocked");
        true
    }
}
