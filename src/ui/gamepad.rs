/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement (diagonals by combining two)
///   Start / A             →  Confirm / Restart
///   Y                     →  Pause
///   Select                →  Quit
///
/// Like the keyboard, movement is one step per press: a new step needs
/// the pad to change direction or return to neutral first.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::Direction;

const STICK_DEADZONE: f32 = 0.35;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Direction for a set of held screen directions. Opposites cancel.
pub fn direction_from(up: bool, down: bool, left: bool, right: bool) -> Option<Direction> {
    let v = i8::from(down) - i8::from(up);
    let h = i8::from(right) - i8::from(left);
    let dir = match (h, v) {
        (0, -1) => Direction::North,
        (-1, -1) => Direction::NorthWest,
        (-1, 0) => Direction::West,
        (-1, 1) => Direction::SouthWest,
        (0, 1) => Direction::South,
        (1, 1) => Direction::SouthEast,
        (1, 0) => Direction::East,
        (1, -1) => Direction::NorthEast,
        _ => return None,
    };
    Some(dir)
}

#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    pause: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::Start, Btn::A],
            cancel:  vec![Btn::Select],
            pause:   vec![Btn::Y],
        }
    }
}

/// Held screen directions, from the d-pad and the stick.
#[derive(Clone, Copy, Debug, Default)]
struct Pad {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; 8],

    dpad: Pad,
    stick_x: f32,
    stick_y: f32,

    /// Combined direction last frame, for edge detection.
    last_dir: Option<Direction>,
    movement: Option<Direction>,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                tracing::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 8],
            dpad: Pad::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            last_dir: None,
            movement: None,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Unknown names are skipped; an
    /// action with no valid names keeps its default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        tracing::warn!("unknown gamepad button {s:?}");
                    }
                    btn
                })
                .collect()
        }
        let map = &mut self.action_map;
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
        let pa = parse_list(&cfg.pause);
        if !pa.is_empty() { map.pause = pa; }
    }

    pub fn update(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        self.update_movement();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    tracing::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    tracing::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        match gilrs_btn {
            Button::DPadUp    => { self.dpad.up = held; return; }
            Button::DPadDown  => { self.dpad.down = held; return; }
            Button::DPadLeft  => { self.dpad.left = held; return; }
            Button::DPadRight => { self.dpad.right = held; return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            let state = &mut self.buttons[btn_index(btn)];
            state.just_pressed = held && !state.held;
            state.held = held;
        }
    }

    fn update_movement(&mut self) {
        // Stick Y is positive up in gilrs.
        let dir = direction_from(
            self.dpad.up || self.stick_y > STICK_DEADZONE,
            self.dpad.down || self.stick_y < -STICK_DEADZONE,
            self.dpad.left || self.stick_x < -STICK_DEADZONE,
            self.dpad.right || self.stick_x > STICK_DEADZONE,
        );
        self.movement = if dir != self.last_dir { dir } else { None };
        self.last_dir = dir;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    /// Direction newly selected this frame.
    pub fn movement(&self) -> Option<Direction> {
        self.movement
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn pause_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.pause)
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad = Pad::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> GamepadState {
        let mut gp = GamepadState::new();
        gp.release_all();
        gp.last_dir = None;
        gp
    }

    #[test]
    fn combined_pad_gives_eight_directions() {
        assert_eq!(direction_from(true, false, false, false), Some(Direction::North));
        assert_eq!(direction_from(true, false, true, false), Some(Direction::NorthWest));
        assert_eq!(direction_from(false, true, true, false), Some(Direction::SouthWest));
        assert_eq!(direction_from(false, false, false, true), Some(Direction::East));
        assert_eq!(direction_from(true, true, false, false), None);
        assert_eq!(direction_from(false, false, false, false), None);
    }

    #[test]
    fn holding_a_direction_steps_once() {
        let mut gp = pad();
        gp.dpad.right = true;
        gp.update_movement();
        assert_eq!(gp.movement(), Some(Direction::East));
        gp.update_movement();
        assert_eq!(gp.movement(), None);

        gp.dpad.down = true;
        gp.update_movement();
        assert_eq!(gp.movement(), Some(Direction::SouthEast));
    }

    #[test]
    fn stick_respects_deadzone() {
        let mut gp = pad();
        gp.stick_x = -0.2;
        gp.update_movement();
        assert_eq!(gp.movement(), None);
        gp.stick_x = -0.9;
        gp.stick_y = 0.9;
        gp.update_movement();
        assert_eq!(gp.movement(), Some(Direction::NorthWest));
    }

    #[test]
    fn config_overrides_and_ignores_unknown_names() {
        let mut gp = pad();
        let cfg = GamepadConfig {
            confirm: vec!["B".into()],
            cancel: vec!["bogus".into()],
            pause: vec!["start".into()],
        };
        gp.load_button_config(&cfg);
        assert_eq!(gp.action_map.confirm, vec![Btn::B]);
        assert_eq!(gp.action_map.cancel, vec![Btn::Select]);
        assert_eq!(gp.action_map.pause, vec![Btn::Start]);
    }
}
