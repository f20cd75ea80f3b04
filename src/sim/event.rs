/// Events emitted by input dispatch and by the per-tick step.
/// The presentation layer consumes these for sound; tests use them to
/// observe transitions.

use crate::domain::entity::MoveDir;
use crate::domain::grid::Cell;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PlayerMoved { to: Cell },
    MoveBlocked { dir: MoveDir },
    KeyPicked,
    DoorUnlocked,
    SummonUnlocked,
    SummonIgnored,
    GolemSpawned,
    DoorSmashed { doors_removed: usize },
    GolemVanished,
}
