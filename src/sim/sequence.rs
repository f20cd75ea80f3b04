/// The golem cutscene: a fixed, timed script driven by the tick's `dt`.
///
/// Steps:
///   WalkToDoor  linear move from the spawn cell to the door cell
///   BreakDoor   instant: remove every door, set the broken-door flag
///   WalkAway    +3 tiles on y
///   FadeOut     alpha 1 → 0
///   (despawn)   golem removed, sequence finished
///
/// A step starts only after the previous one has fully elapsed; leftover
/// time from a tick carries into the next step. Once started the script
/// runs to completion.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::TimingConfig;
use crate::domain::entity::{EntityId, EntityKind, Spawn};
use crate::domain::grid::{Vec2, TILE_SIZE};
use super::builder::{DOOR_CELL, GOLEM_START, Z_ACTOR};
use super::event::GameEvent;
use super::world::{WorldState, SMASH_STATUS};

const WALK_AWAY: Vec2 = Vec2::new(0.0, TILE_SIZE * 3.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceStep {
    WalkToDoor,
    BreakDoor,
    WalkAway,
    FadeOut,
    Done,
}

#[derive(Clone, Debug)]
pub struct GolemSequence {
    golem: EntityId,
    step: SequenceStep,
    elapsed: Duration,
    // Golem position when the current movement step began.
    from: Vec2,
}

impl GolemSequence {
    /// Spawn the golem at its start cell and begin walking.
    pub fn start(world: &mut WorldState, events: &mut Vec<GameEvent>) -> Self {
        let from = GOLEM_START.center();
        let golem = world.registry.spawn(Spawn::tile(EntityKind::Golem, from, Z_ACTOR));
        events.push(GameEvent::GolemSpawned);
        info!("golem summoned");

        GolemSequence {
            golem,
            step: SequenceStep::WalkToDoor,
            elapsed: Duration::ZERO,
            from,
        }
    }

    pub fn is_done(&self) -> bool {
        self.step == SequenceStep::Done
    }

    /// Advance by `dt`. Returns true once the script has finished.
    pub fn advance(&mut self, world: &mut WorldState, dt: Duration, events: &mut Vec<GameEvent>) -> bool {
        let mut budget = dt;

        while !self.is_done() {
            let total = step_duration(self.step, &world.timing);
            let remaining = total.saturating_sub(self.elapsed);

            if budget < remaining {
                self.elapsed += budget;
                self.apply(world, progress(self.elapsed, total));
                return false;
            }

            budget -= remaining;
            self.elapsed = total;
            self.apply(world, 1.0);
            self.finish_step(world, events);
        }

        true
    }

    /// Pose the golem at `t` (0..=1) through the current step.
    fn apply(&self, world: &mut WorldState, t: f32) {
        let Some(golem) = world.registry.get_mut(self.golem) else { return };
        match self.step {
            SequenceStep::WalkToDoor => golem.pos = self.from.lerp(DOOR_CELL.center(), t),
            SequenceStep::WalkAway => golem.pos = self.from.lerp(self.from.add(WALK_AWAY), t),
            SequenceStep::FadeOut => golem.alpha = 1.0 - t,
            SequenceStep::BreakDoor | SequenceStep::Done => {}
        }
    }

    fn finish_step(&mut self, world: &mut WorldState, events: &mut Vec<GameEvent>) {
        let next = match self.step {
            SequenceStep::WalkToDoor => SequenceStep::BreakDoor,
            SequenceStep::BreakDoor => {
                let doors_removed = world.registry.despawn_kind(EntityKind::Door);
                world.flags.golem_has_broken_door = true;
                world.set_status(SMASH_STATUS);
                events.push(GameEvent::DoorSmashed { doors_removed });
                info!(doors_removed, "golem smashed the door");
                SequenceStep::WalkAway
            }
            SequenceStep::WalkAway => SequenceStep::FadeOut,
            SequenceStep::FadeOut => {
                world.registry.despawn(self.golem);
                events.push(GameEvent::GolemVanished);
                info!("golem gone");
                SequenceStep::Done
            }
            SequenceStep::Done => SequenceStep::Done,
        };

        debug!(from = ?self.step, to = ?next, "sequence step");
        self.step = next;
        self.elapsed = Duration::ZERO;
        if let Some(golem) = world.registry.get(self.golem) {
            self.from = golem.pos;
        }
    }
}

fn step_duration(step: SequenceStep, timing: &TimingConfig) -> Duration {
    match step {
        SequenceStep::WalkToDoor => Duration::from_millis(timing.golem_walk_ms),
        SequenceStep::WalkAway => Duration::from_millis(timing.golem_exit_ms),
        SequenceStep::FadeOut => Duration::from_millis(timing.golem_fade_ms),
        SequenceStep::BreakDoor | SequenceStep::Done => Duration::ZERO,
    }
}

fn progress(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        1.0
    } else {
        (elapsed.as_secs_f32() / total.as_secs_f32()).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::grid::{cell_to_world, world_to_cell, Cell};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world() -> WorldState {
        WorldState::new_session(&GameConfig::default(), &mut StdRng::seed_from_u64(3))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn golem_pos(w: &WorldState, seq: &GolemSequence) -> Vec2 {
        w.registry.get(seq.golem).unwrap().pos
    }

    #[test]
    fn start_spawns_golem_at_fixed_cell() {
        let mut w = world();
        let mut ev = Vec::new();
        let seq = GolemSequence::start(&mut w, &mut ev);
        assert_eq!(ev, vec![GameEvent::GolemSpawned]);
        assert_eq!(seq.step, SequenceStep::WalkToDoor);
        assert_eq!(world_to_cell(golem_pos(&w, &seq)), Cell::new(1, 3));
        assert_eq!(w.registry.count(EntityKind::Golem), 1);
        assert!(!w.registry.get(seq.golem).unwrap().solid);
    }

    #[test]
    fn walk_is_linear_toward_door() {
        let mut w = world();
        let mut ev = Vec::new();
        let mut seq = GolemSequence::start(&mut w, &mut ev);
        assert!(!seq.advance(&mut w, ms(1000), &mut ev));
        let mid = cell_to_world(1, 3).lerp(cell_to_world(5, 7), 0.5);
        let p = golem_pos(&w, &seq);
        assert!((p.x - mid.x).abs() < 1e-3 && (p.y - mid.y).abs() < 1e-3);
        assert_eq!(w.registry.count(EntityKind::Door), 1);
        assert!(!w.flags.golem_has_broken_door);
    }

    #[test]
    fn door_breaks_exactly_when_walk_elapses() {
        let mut w = world();
        let mut ev = Vec::new();
        let mut seq = GolemSequence::start(&mut w, &mut ev);
        seq.advance(&mut w, ms(1999), &mut ev);
        assert_eq!(w.registry.count(EntityKind::Door), 1);

        seq.advance(&mut w, ms(1), &mut ev);
        assert_eq!(w.registry.count(EntityKind::Door), 0);
        assert!(w.flags.golem_has_broken_door);
        assert_eq!(w.status, SMASH_STATUS);
        assert_eq!(seq.step, SequenceStep::WalkAway);
        assert_eq!(golem_pos(&w, &seq), cell_to_world(5, 7));
        assert!(ev.contains(&GameEvent::DoorSmashed { doors_removed: 1 }));
    }

    #[test]
    fn leftover_time_carries_into_next_step() {
        let mut w = world();
        let mut ev = Vec::new();
        let mut seq = GolemSequence::start(&mut w, &mut ev);
        // 2000 walk + 500 into the walk away.
        seq.advance(&mut w, ms(2500), &mut ev);
        assert_eq!(seq.step, SequenceStep::WalkAway);
        let p = golem_pos(&w, &seq);
        let door = cell_to_world(5, 7);
        assert!((p.x - door.x).abs() < 1e-3);
        assert!((p.y - (door.y + 12.0)).abs() < 1e-3);
    }

    #[test]
    fn fade_dims_then_despawns() {
        let mut w = world();
        let mut ev = Vec::new();
        let mut seq = GolemSequence::start(&mut w, &mut ev);
        seq.advance(&mut w, ms(4500), &mut ev);
        assert_eq!(seq.step, SequenceStep::FadeOut);
        let g = w.registry.get(seq.golem).unwrap();
        assert!((g.alpha - 0.5).abs() < 1e-3);
        assert_eq!(world_to_cell(g.pos), Cell::new(5, 10));

        assert!(seq.advance(&mut w, ms(500), &mut ev));
        assert!(seq.is_done());
        assert_eq!(w.registry.count(EntityKind::Golem), 0);
        assert_eq!(ev.last(), Some(&GameEvent::GolemVanished));
    }

    #[test]
    fn one_huge_tick_runs_the_whole_script() {
        let mut w = world();
        let mut ev = Vec::new();
        let mut seq = GolemSequence::start(&mut w, &mut ev);
        assert!(seq.advance(&mut w, Duration::from_secs(60), &mut ev));
        assert_eq!(
            ev,
            vec![
                GameEvent::GolemSpawned,
                GameEvent::DoorSmashed { doors_removed: 1 },
                GameEvent::GolemVanished,
            ]
        );
    }

    #[test]
    fn zero_durations_finish_immediately() {
        let cfg = GameConfig::from_toml_str(
            "[timing]\ngolem_walk_ms = 0\ngolem_exit_ms = 0\ngolem_fade_ms = 0\n",
        ).unwrap();
        let mut w = WorldState::new_session(&cfg, &mut StdRng::seed_from_u64(3));
        let mut ev = Vec::new();
        let mut seq = GolemSequence::start(&mut w, &mut ev);
        assert!(seq.advance(&mut w, Duration::ZERO, &mut ev));
        assert!(w.flags.golem_has_broken_door);
        assert!(!w.golem_present());
    }

    #[test]
    fn smash_removes_an_already_unlocked_door() {
        let mut w = world();
        w.flags.has_key = true;
        let doors: Vec<EntityId> = w.registry.with_kind(EntityKind::Door).map(|d| d.id).collect();
        for id in doors {
            w.registry.get_mut(id).unwrap().solid = false;
        }
        let mut ev = Vec::new();
        let mut seq = GolemSequence::start(&mut w, &mut ev);
        seq.advance(&mut w, ms(2000), &mut ev);
        assert_eq!(w.registry.count(EntityKind::Door), 0);
    }
}
