/// Entities: everything placed in the world, from grass to the golem.
///
/// Kinds form a closed set, so interaction dispatch is an exhaustive
/// `match` rather than a lookup by name. Many entities share a kind
/// (every wall is a `Wall`); the registry id tells instances apart.

use super::grid::{Rect, Vec2, TILE_SIZE};

/// Movement direction (one tile per press)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    /// Unit step in world space (y-up).
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Up => (0, 1),
            MoveDir::Down => (0, -1),
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
        }
    }
}

/// On-screen buttons. They live in the registry like any other entity
/// so a tap is resolved by the same hit test.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ControlKind {
    Move(MoveDir),
    SummonGolem,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GrassVariant {
    Grass1,
    Grass2,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Grass(GrassVariant),
    Floor,
    Wall,
    Door,
    Key,
    Bed,
    Bookshelf,
    Player,
    Golem,
    Control(ControlKind),
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntityId(pub u32);

#[derive(Clone, Debug)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Center in world units.
    pub pos: Vec2,
    pub size: Vec2,
    /// Carries a collision body. Only the door ever loses it.
    pub solid: bool,
    /// 0.0 = invisible, 1.0 = opaque.
    pub alpha: f32,
    /// Draw priority; higher is drawn on top and hit first.
    pub z: f32,
}

impl Entity {
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.pos, self.size)
    }

    pub fn is_visible(&self) -> bool {
        self.alpha > 0.0
    }
}

/// Placement request handed to the registry, which assigns the id.
#[derive(Clone, Debug)]
pub struct Spawn {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub solid: bool,
    pub alpha: f32,
    pub z: f32,
}

impl Spawn {
    /// One opaque tile-sized entity, not solid.
    pub fn tile(kind: EntityKind, pos: Vec2, z: f32) -> Self {
        Spawn {
            kind,
            pos,
            size: Vec2::new(TILE_SIZE, TILE_SIZE),
            solid: false,
            alpha: 1.0,
            z,
        }
    }

    pub fn solid(mut self) -> Self {
        self.solid = true;
        self
    }

    pub fn sized(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::cell_to_world;

    #[test]
    fn move_deltas_are_unit_cardinal() {
        assert_eq!(MoveDir::Up.delta(), (0, 1));
        assert_eq!(MoveDir::Down.delta(), (0, -1));
        assert_eq!(MoveDir::Left.delta(), (-1, 0));
        assert_eq!(MoveDir::Right.delta(), (1, 0));
    }

    #[test]
    fn spawn_builder_defaults() {
        let s = Spawn::tile(EntityKind::Door, cell_to_world(5, 7), 1.0);
        assert!(!s.solid);
        assert_eq!(s.alpha, 1.0);
        assert_eq!(s.size, Vec2::new(16.0, 16.0));
        let s = s.solid().alpha(0.0);
        assert!(s.solid);
        assert_eq!(s.alpha, 0.0);
    }

    #[test]
    fn bounds_cover_one_tile() {
        let e = Entity {
            id: EntityId(1),
            kind: EntityKind::Key,
            pos: cell_to_world(5, 1),
            size: Vec2::new(16.0, 16.0),
            solid: false,
            alpha: 1.0,
            z: 0.5,
        };
        let b = e.bounds();
        assert_eq!(b.min, Vec2::new(80.0, 16.0));
        assert_eq!(b.max, Vec2::new(96.0, 32.0));
        assert!(e.is_visible());
    }
}
