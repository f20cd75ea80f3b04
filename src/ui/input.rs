/// Terminal input collector.
///
/// Drains every pending crossterm event once per frame and sorts it into:
///   - key presses (Press and Repeat; Release is ignored, so a held arrow
///     walks at the terminal's repeat rate)
///   - left-button mouse presses, as terminal (column, row)
///   - terminal resizes
///
/// Mouse reporting needs `EnableMouseCapture`, which the renderer turns on.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use tracing::trace;

use crate::domain::entity::{ControlKind, MoveDir};

pub struct InputState {
    /// Key presses collected during the most recent `drain_events()`.
    pub keys: Vec<KeyEvent>,

    /// Left-button presses, terminal (column, row).
    pub clicks: Vec<(u16, u16)>,

    pub resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            keys: Vec::with_capacity(8),
            clicks: Vec::with_capacity(4),
            resized: false,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame, before dispatch.
    pub fn drain_events(&mut self) {
        self.keys.clear();
        self.clicks.clear();
        self.resized = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.record(ev),
                Err(e) => {
                    trace!(error = %e, "dropped terminal event");
                    break;
                }
            }
        }
    }

    fn record(&mut self, ev: Event) {
        match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.keys.push(key),
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                self.clicks.push((m.column, m.row));
            }
            Event::Resize(_, _) => self.resized = true,
            _ => {}
        }
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.keys.iter().any(|k| k.code == code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.keys.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// On-screen controls pressed from the keyboard, in arrival order.
    pub fn controls(&self) -> Vec<ControlKind> {
        self.keys
            .iter()
            .filter(|k| !k.modifiers.contains(KeyModifiers::CONTROL))
            .filter_map(|k| key_to_control(k.code))
            .collect()
    }
}

/// Arrows / WASD move, G summons.
pub fn key_to_control(code: KeyCode) -> Option<ControlKind> {
    let control = match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => ControlKind::Move(MoveDir::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => ControlKind::Move(MoveDir::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => ControlKind::Move(MoveDir::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => ControlKind::Move(MoveDir::Right),
        KeyCode::Char('g') | KeyCode::Char('G') => ControlKind::SummonGolem,
        _ => return None,
    };
    Some(control)
}
