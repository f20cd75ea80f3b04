/// Gamepad input via gilrs (feature `gamepad`).
///
/// Every action is edge-triggered: one press, one tile, one summon.
/// Default mapping (overridable in config.toml `[gamepad]`):
///   D-pad / Left Stick  →  Move
///   A                   →  Summon golem
///   Start               →  New session
///   Select              →  Quit
///
/// Without the feature the tracker exists but never reports anything.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::{info, warn};

use crate::config::GamepadConfig;
use crate::domain::entity::MoveDir;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

const DIRS: [MoveDir; 4] = [MoveDir::Up, MoveDir::Down, MoveDir::Left, MoveDir::Right];

/// Face and shoulder buttons that can be bound to an action.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

fn dir_index(dir: MoveDir) -> usize {
    match dir {
        MoveDir::Up => 0,
        MoveDir::Down => 1,
        MoveDir::Left => 2,
        MoveDir::Right => 3,
    }
}

struct ActionMap {
    summon: Vec<Btn>,
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl ActionMap {
    /// Unknown names are skipped; an action left with no button keeps its default.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String], fallback: Btn) -> Vec<Btn> {
            let btns: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if btns.is_empty() { vec![fallback] } else { btns }
        }
        ActionMap {
            summon: parse_list(&cfg.summon, Btn::A),
            restart: parse_list(&cfg.restart, Btn::Start),
            quit: parse_list(&cfg.quit, Btn::Select),
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons that went down since the last `update()`.
    pressed: Vec<Btn>,

    // Directions: d-pad and stick, held last frame / pressed this frame.
    dpad_held: [bool; 4],
    stick_held: [bool; 4],
    dir_pressed: [bool; 4],
    stick_x: f32,
    stick_y: f32,

    actions: ActionMap,

    connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                warn!(error = %e, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            pressed: Vec::with_capacity(4),
            dpad_held: [false; 4],
            stick_held: [false; 4],
            dir_pressed: [false; 4],
            stick_x: 0.0,
            stick_y: 0.0,
            actions: ActionMap::from_config(cfg),
            connected,
        }
    }

    /// A pad is attached (or has sent input since startup).
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Poll once per frame, before reading any action.
    pub fn update(&mut self) {
        self.pressed.clear();
        self.dir_pressed = [false; 4];

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.on_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => self.on_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, v, _) => self.stick_x = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => self.stick_y = v,
                EventType::Connected => {
                    self.connected = true;
                    info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                    info!("gamepad disconnected");
                }
                _ => {}
            }
        }

        self.update_stick();
    }

    #[cfg(feature = "gamepad")]
    fn on_button(&mut self, btn: Button, down: bool) {
        let dir = match btn {
            Button::DPadUp => Some(MoveDir::Up),
            Button::DPadDown => Some(MoveDir::Down),
            Button::DPadLeft => Some(MoveDir::Left),
            Button::DPadRight => Some(MoveDir::Right),
            _ => None,
        };
        if let Some(dir) = dir {
            let i = dir_index(dir);
            if down && !self.dpad_held[i] {
                self.dir_pressed[i] = true;
            }
            self.dpad_held[i] = down;
            return;
        }

        if down {
            if let Some(b) = Btn::from_gilrs(btn) {
                self.pressed.push(b);
            }
        }
    }

    /// Stick crossing the deadzone counts as one press per direction.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn update_stick(&mut self) {
        let now = [
            self.stick_y > STICK_DEADZONE,
            self.stick_y < -STICK_DEADZONE,
            self.stick_x < -STICK_DEADZONE,
            self.stick_x > STICK_DEADZONE,
        ];
        for i in 0..4 {
            if now[i] && !self.stick_held[i] {
                self.dir_pressed[i] = true;
            }
        }
        self.stick_held = now;
    }

    // ── Action queries ──

    fn any_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|b| self.pressed.contains(b))
    }

    /// First direction pressed this frame, in up/down/left/right order.
    pub fn move_pressed(&self) -> Option<MoveDir> {
        DIRS.into_iter().find(|&d| self.dir_pressed[dir_index(d)])
    }

    pub fn summon_pressed(&self) -> bool {
        self.any_pressed(&self.actions.summon)
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_pressed(&self.actions.restart)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(&self.actions.quit)
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.pressed.clear();
        self.dpad_held = [false; 4];
        self.stick_held = [false; 4];
        self.dir_pressed = [false; 4];
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
