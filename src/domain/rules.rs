/// Movement rules: pure functions, no side effects.
///
/// These encode "what is legal" without performing the move.
///
/// ## Blocking Truth Table
///
/// Evaluated over every entity whose bounds contain the target point.
/// ┌───────────────────────────────────┬─────────┐
/// │ Entity at target                   │ Result  │
/// ├───────────────────────────────────┼─────────┤
/// │ Wall                               │ BLOCK   │
/// │ Door, has_key = false              │ BLOCK   │
/// │ Door, has_key = true, still solid  │ BLOCK   │ (unlocks next tick)
/// │ Door, has_key = true, not solid    │ pass    │
/// │ anything else / nothing            │ pass    │
/// └───────────────────────────────────┴─────────┘
///
/// Bed, bookshelf, key, floor, grass and controls are all decoration as far
/// as movement is concerned.

use super::entity::{Entity, EntityKind, MoveDir};
use super::grid::{Vec2, TILE_SIZE};

/// Does this entity stop the player from entering its cell?
pub fn blocks(e: &Entity, has_key: bool) -> bool {
    match e.kind {
        EntityKind::Wall => true,
        EntityKind::Door => !has_key || e.solid,
        EntityKind::Grass(_)
        | EntityKind::Floor
        | EntityKind::Key
        | EntityKind::Bed
        | EntityKind::Bookshelf
        | EntityKind::Player
        | EntityKind::Golem
        | EntityKind::Control(_) => false,
    }
}

/// Can the player move onto a point occupied by `occupants`?
pub fn can_move<'a, I>(occupants: I, has_key: bool) -> bool
where
    I: IntoIterator<Item = &'a Entity>,
{
    !occupants.into_iter().any(|e| blocks(e, has_key))
}

/// Target of a one-tile step from `pos`.
pub fn step_target(pos: Vec2, dir: MoveDir) -> Vec2 {
    let (dx, dy) = dir.delta();
    Vec2::new(pos.x + dx as f32 * TILE_SIZE, pos.y + dy as f32 * TILE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{EntityId, GrassVariant};
    use crate::domain::grid::cell_to_world;

    fn ent(kind: EntityKind, solid: bool) -> Entity {
        Entity {
            id: EntityId(1),
            kind,
            pos: cell_to_world(0, 0),
            size: Vec2::new(TILE_SIZE, TILE_SIZE),
            solid,
            alpha: 1.0,
            z: 0.0,
        }
    }

    #[test]
    fn empty_target_is_free() {
        assert!(can_move(std::iter::empty::<&Entity>(), false));
        assert!(can_move(std::iter::empty::<&Entity>(), true));
    }

    #[test]
    fn wall_always_blocks() {
        let w = ent(EntityKind::Wall, true);
        assert!(!can_move([&w], false));
        assert!(!can_move([&w], true));
        // A wall without a body still blocks: the rule is by kind.
        let w = ent(EntityKind::Wall, false);
        assert!(!can_move([&w], true));
    }

    #[test]
    fn locked_door_blocks_without_key() {
        let d = ent(EntityKind::Door, true);
        assert!(!can_move([&d], false));
    }

    #[test]
    fn door_with_key_blocks_until_solidity_stripped() {
        let d = ent(EntityKind::Door, true);
        assert!(!can_move([&d], true));
        let d = ent(EntityKind::Door, false);
        assert!(can_move([&d], true));
    }

    #[test]
    fn decoration_never_blocks() {
        let floor = ent(EntityKind::Floor, false);
        let bed = ent(EntityKind::Bed, false);
        let shelf = ent(EntityKind::Bookshelf, false);
        let key = ent(EntityKind::Key, false);
        let grass = ent(EntityKind::Grass(GrassVariant::Grass2), false);
        assert!(can_move([&floor, &bed, &shelf, &key, &grass], false));
    }

    #[test]
    fn any_blocker_wins() {
        let floor = ent(EntityKind::Floor, false);
        let wall = ent(EntityKind::Wall, true);
        assert!(!can_move([&floor, &wall], true));
    }

    #[test]
    fn step_target_moves_one_tile() {
        let p = cell_to_world(5, 3);
        assert_eq!(step_target(p, MoveDir::Up), cell_to_world(5, 4));
        assert_eq!(step_target(p, MoveDir::Down), cell_to_world(5, 2));
        assert_eq!(step_target(p, MoveDir::Left), cell_to_world(4, 3));
        assert_eq!(step_target(p, MoveDir::Right), cell_to_world(6, 3));
    }
}
