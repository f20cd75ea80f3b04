/// Input dispatch: pointer taps and control presses.
///
/// A tap hit-tests every entity under the point (topmost first) and
/// dispatches each hit by kind. Hits are independent: a prop and a control
/// under the same point both fire. Interactions (bookshelf, summon) run over
/// all hits before any move control, so a move never changes what the same
/// tap reads. Keyboard and gamepad skip the hit test and press a control
/// directly.

use tracing::debug;

use crate::domain::entity::{ControlKind, EntityKind, MoveDir};
use crate::domain::grid::Vec2;
use crate::domain::rules;
use super::event::GameEvent;
use super::sequence::GolemSequence;
use super::world::WorldState;

pub fn handle_pointer(world: &mut WorldState, p: Vec2) -> Vec<GameEvent> {
    let (moves, interactions): (Vec<EntityKind>, Vec<EntityKind>) = world.registry
        .at(p)
        .iter()
        .map(|e| e.kind)
        .partition(|k| matches!(k, EntityKind::Control(ControlKind::Move(_))));
    let mut events = Vec::new();
    for kind in interactions.into_iter().chain(moves) {
        dispatch(world, kind, &mut events);
    }
    events
}

pub fn press_control(world: &mut WorldState, control: ControlKind) -> Vec<GameEvent> {
    let mut events = Vec::new();
    dispatch(world, EntityKind::Control(control), &mut events);
    events
}

fn dispatch(world: &mut WorldState, kind: EntityKind, events: &mut Vec<GameEvent>) {
    match kind {
        EntityKind::Bookshelf => {
            if world.reveal_summon() {
                events.push(GameEvent::SummonUnlocked);
            }
        }
        EntityKind::Control(ControlKind::SummonGolem) => try_summon(world, events),
        EntityKind::Control(ControlKind::Move(dir)) => try_move(world, dir, events),
        EntityKind::Grass(_)
        | EntityKind::Floor
        | EntityKind::Wall
        | EntityKind::Door
        | EntityKind::Key
        | EntityKind::Bed
        | EntityKind::Player
        | EntityKind::Golem => {}
    }
}

fn try_move(world: &mut WorldState, dir: MoveDir, events: &mut Vec<GameEvent>) {
    let target = rules::step_target(world.player_pos(), dir);
    if world.can_move(target) {
        world.set_player_pos(target);
        events.push(GameEvent::PlayerMoved { to: world.player_cell() });
    } else {
        events.push(GameEvent::MoveBlocked { dir });
    }
}

/// Start the golem script. Only once per session, and only after the
/// spell has been read.
fn try_summon(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let allowed = world.flags.summon_unlocked
        && world.sequence.is_none()
        && !world.flags.golem_has_broken_door;
    if !allowed {
        debug!(flags = ?world.flags, "summon ignored");
        events.push(GameEvent::SummonIgnored);
        return;
    }
    let seq = GolemSequence::start(world, events);
    world.sequence = Some(seq);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::Spawn;
    use crate::domain::grid::{cell_to_world, Cell};
    use crate::sim::world::SPELL_STATUS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world() -> WorldState {
        WorldState::new_session(&GameConfig::default(), &mut StdRng::seed_from_u64(5))
    }

    #[test]
    fn tapping_dpad_moves_player() {
        let mut w = world();
        let ev = handle_pointer(&mut w, cell_to_world(-2, -2));
        assert_eq!(ev, vec![GameEvent::PlayerMoved { to: Cell::new(5, 4) }]);
        handle_pointer(&mut w, cell_to_world(-1, -3));
        assert_eq!(w.player_cell(), Cell::new(6, 4));
        handle_pointer(&mut w, cell_to_world(-2, -4));
        handle_pointer(&mut w, cell_to_world(-3, -3));
        assert_eq!(w.player_cell(), Cell::new(5, 3));
    }

    #[test]
    fn tapping_empty_ground_does_nothing() {
        let mut w = world();
        assert!(handle_pointer(&mut w, cell_to_world(3, 3)).is_empty());
        assert!(handle_pointer(&mut w, Vec2::new(-5000.0, 0.0)).is_empty());
        assert_eq!(w.player_cell(), Cell::new(5, 3));
    }

    #[test]
    fn wall_blocks_and_position_is_unchanged() {
        let mut w = world();
        w.set_player_pos(cell_to_world(0, 3));
        let ev = press_control(&mut w, ControlKind::Move(MoveDir::Left));
        assert_eq!(ev, vec![GameEvent::MoveBlocked { dir: MoveDir::Left }]);
        assert_eq!(w.player_cell(), Cell::new(0, 3));
    }

    #[test]
    fn locked_door_blocks_without_key() {
        let mut w = world();
        w.set_player_pos(cell_to_world(5, 6));
        press_control(&mut w, ControlKind::Move(MoveDir::Up));
        assert_eq!(w.player_cell(), Cell::new(5, 6));
    }

    #[test]
    fn bed_and_bookshelf_are_walkable() {
        let mut w = world();
        w.set_player_pos(cell_to_world(5, 2));
        press_control(&mut w, ControlKind::Move(MoveDir::Down));
        assert_eq!(w.player_cell(), Cell::new(5, 1));
        w.set_player_pos(cell_to_world(2, 4));
        press_control(&mut w, ControlKind::Move(MoveDir::Up));
        assert_eq!(w.player_cell(), Cell::new(2, 5));
    }

    #[test]
    fn tapping_bookshelf_reveals_summon() {
        let mut w = world();
        let ev = handle_pointer(&mut w, cell_to_world(2, 5));
        assert_eq!(ev, vec![GameEvent::SummonUnlocked]);
        assert_eq!(w.status, SPELL_STATUS);
        assert!(handle_pointer(&mut w, cell_to_world(2, 5)).is_empty());
        assert!(w.flags.summon_unlocked);
    }

    #[test]
    fn summon_is_ignored_before_the_spell() {
        let mut w = world();
        let ev = handle_pointer(&mut w, cell_to_world(10, -3));
        assert_eq!(ev, vec![GameEvent::SummonIgnored]);
        assert!(!w.golem_present());
        assert!(w.sequence.is_none());
    }

    #[test]
    fn summon_while_running_is_ignored() {
        let mut w = world();
        w.reveal_summon();
        let ev = handle_pointer(&mut w, cell_to_world(9, -3));
        assert_eq!(ev, vec![GameEvent::GolemSpawned]);
        let ev = press_control(&mut w, ControlKind::SummonGolem);
        assert_eq!(ev, vec![GameEvent::SummonIgnored]);
        assert_eq!(w.registry.count(EntityKind::Golem), 1);
    }

    #[test]
    fn overlapping_prop_and_control_both_fire() {
        let mut w = world();
        let up = cell_to_world(-2, -2);
        w.registry.spawn(Spawn::tile(EntityKind::Bookshelf, up, 1.0));
        let ev = handle_pointer(&mut w, up);
        // The shelf fires before the move even though the control is on top.
        assert_eq!(
            ev,
            vec![GameEvent::SummonUnlocked, GameEvent::PlayerMoved { to: Cell::new(5, 4) }]
        );
    }

    #[test]
    fn moves_run_after_every_interaction() {
        let mut w = world();
        let spot = cell_to_world(-2, -2);
        w.reveal_summon();
        // A summon button drawn below the up arrow at the same point.
        w.registry.spawn(Spawn::tile(EntityKind::Control(ControlKind::SummonGolem), spot, 50.0));
        w.registry.spawn(Spawn::tile(EntityKind::Bookshelf, spot, 1.0));
        let ev = handle_pointer(&mut w, spot);
        assert_eq!(
            ev,
            vec![
                GameEvent::GolemSpawned,
                GameEvent::PlayerMoved { to: Cell::new(5, 4) },
            ]
        );
    }

    #[test]
    fn reveal_and_summon_in_one_tap() {
        let mut w = world();
        let spot = cell_to_world(11, -3);
        w.registry.spawn(Spawn::tile(EntityKind::Bookshelf, spot, 1.0));
        // The hidden button is on top, so it fires before the shelf reveals it.
        let ev = handle_pointer(&mut w, spot);
        assert_eq!(ev, vec![GameEvent::SummonIgnored, GameEvent::SummonUnlocked]);
        let ev = handle_pointer(&mut w, spot);
        assert_eq!(ev, vec![GameEvent::GolemSpawned]);
    }
}
