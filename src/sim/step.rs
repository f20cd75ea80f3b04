/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Bookshelf proximity (reveal the summon action)
///   2. Key pickup, or, once the key is held, door unlock
///   3. Scripted sequence
///   4. Notice countdown
///
/// Steps 2's two branches are exclusive, so the door is never unlocked on the
/// tick the key is picked up. Movement happens in `interact`, between ticks.

use std::time::Duration;

use tracing::info;

use crate::domain::entity::{EntityId, EntityKind};
use super::event::GameEvent;
use super::world::WorldState;

pub const KEY_NOTICE: &str = "You picked up the key!";
pub const UNLOCK_NOTICE: &str = "Door unlocked!";

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, dt: Duration) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    resolve_bookshelf(world, &mut events);
    if !world.flags.has_key {
        resolve_key_pickup(world, &mut events);
    } else {
        resolve_door_unlock(world, &mut events);
    }
    resolve_sequence(world, dt, &mut events);
    resolve_notice(world);

    events
}

// ══════════════════════════════════════════════════════════════
// Proximity triggers
// ══════════════════════════════════════════════════════════════

fn resolve_bookshelf(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let hits = world.registry.intersecting(EntityKind::Bookshelf, &world.player_bounds());
    for _ in hits {
        if world.reveal_summon() {
            events.push(GameEvent::SummonUnlocked);
        }
    }
}

fn resolve_key_pickup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let keys = world.registry.intersecting(EntityKind::Key, &world.player_bounds());
    for id in keys {
        world.flags.has_key = true;
        world.registry.despawn(id);
        let ticks = world.timing.notice_ticks;
        world.set_notice(KEY_NOTICE, ticks);
        events.push(GameEvent::KeyPicked);
        info!(tick = world.tick, "key picked up");
    }
}

fn resolve_door_unlock(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let solid_doors: Vec<EntityId> = world.registry
        .with_kind(EntityKind::Door)
        .filter(|d| d.solid)
        .map(|d| d.id)
        .collect();

    for id in solid_doors {
        if let Some(door) = world.registry.get_mut(id) {
            door.solid = false;
        }
        let ticks = world.timing.notice_ticks;
        world.set_notice(UNLOCK_NOTICE, ticks);
        events.push(GameEvent::DoorUnlocked);
        info!(tick = world.tick, "door unlocked");
    }
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

fn resolve_sequence(world: &mut WorldState, dt: Duration, events: &mut Vec<GameEvent>) {
    // Taken out while it runs so it can mutate the rest of the world.
    if let Some(mut seq) = world.sequence.take() {
        if !seq.advance(world, dt, events) {
            world.sequence = Some(seq);
        }
    }
}

fn resolve_notice(world: &mut WorldState) {
    if world.notice_timer > 0 {
        world.notice_timer -= 1;
        if world.notice_timer == 0 {
            world.notice.clear();
        }
    }
}
