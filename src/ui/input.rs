/// Keyboard input tracker.
///
/// Movement is edge-triggered: one step per key press.
///
/// With crossterm's keyboard enhancement (`honor_release`), the terminal
/// tells Press, Repeat and Release apart: every Press is a step and
/// Repeat never is, however long the key is held.
///
/// Without it every event looks like a Press, so a key counts as held
/// until `HOLD_TIMEOUT` passes with no event for it. Two limits follow:
/// a second tap of the same key inside the timeout is dropped, and
/// holding a key steps again once the terminal's autorepeat delay
/// (typically 250-500 ms) exceeds the timeout.
///
/// ## Key map
///
/// ┌───────┬───────────┬─────────┐
/// │ Key   │ Direction │ (Δx,Δy) │
/// ├───────┼───────────┼─────────┤
/// │ W  ↑  │ North     │ (−1,−1) │
/// │ Q     │ NorthWest │ (−1, 0) │
/// │ A  ←  │ West      │ (−1,+1) │
/// │ Z     │ SouthWest │ ( 0,+1) │
/// │ S  ↓  │ South     │ (+1,+1) │
/// │ C     │ SouthEast │ (+1, 0) │
/// │ D  →  │ East      │ (+1,−1) │
/// │ E     │ NorthEast │ ( 0,−1) │
/// └───────┴───────────┴─────────┘

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        let code = normalize(key.code);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&code);
            }
            KeyEventKind::Release => {}
            KeyEventKind::Repeat if self.honor_release => {
                self.last_active.insert(code, now);
            }
            KeyEventKind::Press if self.honor_release => {
                self.last_active.insert(code, now);
                self.fresh_presses.push(code);
            }
            _ => {
                let was_held = self.last_active.get(&code)
                    .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
                    .unwrap_or(false);
                self.last_active.insert(code, now);
                if !was_held {
                    self.fresh_presses.push(code);
                }
            }
        }
    }

    /// Was this key freshly pressed this frame? Letters are matched
    /// lowercase.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// First movement key pressed this frame.
    pub fn movement(&self) -> Option<Direction> {
        self.fresh_presses.iter().find_map(|&code| direction_for_key(code))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

pub fn direction_for_key(code: KeyCode) -> Option<Direction> {
    let dir = match code {
        KeyCode::Char('w') | KeyCode::Up => Direction::North,
        KeyCode::Char('q') => Direction::NorthWest,
        KeyCode::Char('a') | KeyCode::Left => Direction::West,
        KeyCode::Char('z') => Direction::SouthWest,
        KeyCode::Char('s') | KeyCode::Down => Direction::South,
        KeyCode::Char('c') => Direction::SouthEast,
        KeyCode::Char('d') | KeyCode::Right => Direction::East,
        KeyCode::Char('e') => Direction::NorthEast,
        _ => return None,
    };
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(KeyCode::Char(c), KeyModifiers::NONE, kind)
    }

    #[test]
    fn every_direction_has_a_letter() {
        for dir in Direction::ALL {
            assert!(
                "wqazscde".chars().any(|c| direction_for_key(KeyCode::Char(c)) == Some(dir)),
                "{dir:?} has no key"
            );
        }
        assert_eq!(direction_for_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn uppercase_counts_as_the_same_key() {
        let mut input = InputState::new();
        input.record(key('Z', KeyEventKind::Press), Instant::now());
        assert_eq!(input.movement(), Some(Direction::SouthWest));
    }

    #[test]
    fn repeat_while_held_is_not_a_new_press() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.record(key('d', KeyEventKind::Press), t0);
        assert_eq!(input.movement(), Some(Direction::East));

        input.fresh_presses.clear();
        input.record(key('d', KeyEventKind::Repeat), t0 + Duration::from_millis(30));
        assert_eq!(input.movement(), None);
    }

    #[test]
    fn release_rearms_the_key() {
        let mut input = InputState::new();
        input.honor_release = true;
        let t0 = Instant::now();
        input.record(key('s', KeyEventKind::Press), t0);
        input.record(key('s', KeyEventKind::Release), t0);
        input.fresh_presses.clear();
        input.record(key('s', KeyEventKind::Press), t0 + Duration::from_millis(10));
        assert_eq!(input.movement(), Some(Direction::South));
    }

    #[test]
    fn reported_repeats_never_step() {
        let mut input = InputState::new();
        input.honor_release = true;
        let t0 = Instant::now();
        input.record(key('a', KeyEventKind::Press), t0);
        assert_eq!(input.movement(), Some(Direction::West));

        input.fresh_presses.clear();
        for ms in [300, 330, 600, 1200] {
            input.record(key('a', KeyEventKind::Repeat), t0 + Duration::from_millis(ms));
        }
        assert_eq!(input.movement(), None);
    }

    #[test]
    fn quick_second_tap_counts_when_kinds_are_reported() {
        let mut input = InputState::new();
        input.honor_release = true;
        let t0 = Instant::now();
        input.record(key('e', KeyEventKind::Press), t0);
        input.record(key('e', KeyEventKind::Release), t0 + Duration::from_millis(20));
        input.fresh_presses.clear();
        input.record(key('e', KeyEventKind::Press), t0 + Duration::from_millis(60));
        assert_eq!(input.movement(), Some(Direction::NorthEast));
    }

    #[test]
    fn fallback_drops_a_tap_inside_the_timeout() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.record(key('e', KeyEventKind::Press), t0);
        input.fresh_presses.clear();
        input.record(key('e', KeyEventKind::Press), t0 + Duration::from_millis(60));
        assert_eq!(input.movement(), None);
        input.record(key('e', KeyEventKind::Press), t0 + HOLD_TIMEOUT * 2);
        assert_eq!(input.movement(), Some(Direction::NorthEast));
    }

    #[test]
    fn ctrl_c_is_seen() {
        let mut input = InputState::new();
        input.record(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(input.ctrl_c_pressed());
    }
}
