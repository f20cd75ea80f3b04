/// World builder: lays out the single room.
///
/// Layout (room-local tiles, y-up; `D` = door gap in the top wall):
///
///   row  7   # # # # # # D # # # # #
///   row  6   # . . . . . . . . . . #
///   row  5   # . . B . . . . . . . #      B = bookshelf (2, 5)
///   row  4   # . . . . . . . . . . #
///   row  3   # . G . . . P . . . . #      P = player (5, 3), G = golem start
///   row  2   # . . . . . . . . . . #
///   row  1   # . . . . . K . . . . #      K = key under the bed (5, 1)
///   row  0   # . . . . . . . . . . #
///   row -1   # # # # # # # # # # # #
///           -1 0 1 2 3 4 5 6 7 8 9 10
///
/// Grass covers a viewport-sized range around the world origin, behind
/// everything. Only the grass variant is random; gameplay never sees it.

use rand::Rng;

use crate::config::ViewConfig;
use crate::domain::entity::{ControlKind, EntityId, EntityKind, GrassVariant, MoveDir, Spawn};
use crate::domain::grid::{cell_to_world, Cell, Vec2, ROOM_COLS, ROOM_ROWS, TILE_SIZE};
use super::registry::Registry;

pub const DOOR_CELL: Cell = Cell::new(ROOM_COLS / 2, ROOM_ROWS);
pub const PLAYER_START: Cell = Cell::new(5, 3);
pub const BED_CELL: Cell = Cell::new(5, 1);
pub const KEY_CELL: Cell = Cell::new(5, 1);
pub const BOOKSHELF_CELL: Cell = Cell::new(2, 5);
pub const GOLEM_START: Cell = Cell::new(1, 3);

// ── Draw order ──
const Z_GRASS: f32 = -3.0;
const Z_FLOOR: f32 = -1.0;
const Z_WALL: f32 = 0.0;
const Z_BED: f32 = 0.0;
const Z_KEY: f32 = 0.5;
const Z_DOOR: f32 = 1.0;
const Z_BOOKSHELF: f32 = 1.0;
pub const Z_ACTOR: f32 = 2.0;
const Z_CONTROL: f32 = 100.0;

/// Controls hang off the camera center, below the room.
const DPAD_OFFSET: Vec2 = Vec2::new(-104.0, -96.0);
const SUMMON_OFFSET: Vec2 = Vec2::new(88.0, -96.0);
const SUMMON_SIZE: Vec2 = Vec2::new(TILE_SIZE * 3.0, TILE_SIZE);

/// Ids of the single-instance entities the session needs to find again.
pub struct Layout {
    pub player: EntityId,
    pub summon_button: EntityId,
}

pub fn build_world<R: Rng>(
    registry: &mut Registry,
    view: &ViewConfig,
    camera_center: Vec2,
    rng: &mut R,
) -> Layout {
    place_grass(registry, view, rng);
    place_floor(registry);
    place_walls(registry);
    place_door(registry);
    place_props(registry);
    let player = registry.spawn(Spawn::tile(EntityKind::Player, PLAYER_START.center(), Z_ACTOR));
    let summon_button = place_controls(registry, camera_center);

    Layout { player, summon_button }
}

fn place_grass<R: Rng>(registry: &mut Registry, view: &ViewConfig, rng: &mut R) {
    let tiles_wide = (view.width / TILE_SIZE) as i32;
    let tiles_high = (view.height / TILE_SIZE) as i32;

    for row in -tiles_high..=tiles_high {
        for col in -tiles_wide..=tiles_wide {
            let variant = if rng.gen_bool(0.5) { GrassVariant::Grass1 } else { GrassVariant::Grass2 };
            registry.spawn(Spawn::tile(EntityKind::Grass(variant), cell_to_world(col, row), Z_GRASS));
        }
    }
}

fn place_floor(registry: &mut Registry) {
    for row in 0..ROOM_ROWS {
        for col in 0..ROOM_COLS {
            registry.spawn(Spawn::tile(EntityKind::Floor, cell_to_world(col, row), Z_FLOOR));
        }
    }
}

fn place_walls(registry: &mut Registry) {
    for col in -1..=ROOM_COLS {
        place_wall(registry, col, -1);
        if col == DOOR_CELL.col {
            continue; // gap for the door
        }
        place_wall(registry, col, ROOM_ROWS);
    }

    for row in 0..ROOM_ROWS {
        place_wall(registry, -1, row);
        place_wall(registry, ROOM_COLS, row);
    }
}

fn place_wall(registry: &mut Registry, col: i32, row: i32) {
    registry.spawn(Spawn::tile(EntityKind::Wall, cell_to_world(col, row), Z_WALL).solid());
}

fn place_door(registry: &mut Registry) {
    registry.spawn(Spawn::tile(EntityKind::Door, DOOR_CELL.center(), Z_DOOR).solid());
}

fn place_props(registry: &mut Registry) {
    registry.spawn(Spawn::tile(EntityKind::Bed, BED_CELL.center(), Z_BED));
    registry.spawn(Spawn::tile(EntityKind::Bookshelf, BOOKSHELF_CELL.center(), Z_BOOKSHELF));
    registry.spawn(Spawn::tile(EntityKind::Key, KEY_CELL.center(), Z_KEY));
}

/// Directional pad plus the summon button (hidden until revealed).
fn place_controls(registry: &mut Registry, camera_center: Vec2) -> EntityId {
    let pad = camera_center.add(DPAD_OFFSET);
    let arrows = [
        (MoveDir::Up, Vec2::new(0.0, TILE_SIZE)),
        (MoveDir::Down, Vec2::new(0.0, -TILE_SIZE)),
        (MoveDir::Left, Vec2::new(-TILE_SIZE, 0.0)),
        (MoveDir::Right, Vec2::new(TILE_SIZE, 0.0)),
    ];
    for (dir, off) in arrows {
        let kind = EntityKind::Control(ControlKind::Move(dir));
        registry.spawn(Spawn::tile(kind, pad.add(off), Z_CONTROL));
    }

    let summon = Spawn::tile(EntityKind::Control(ControlKind::SummonGolem), camera_center.add(SUMMON_OFFSET), Z_CONTROL)
        .sized(SUMMON_SIZE)
        .alpha(0.0);
    registry.spawn(summon)
}
