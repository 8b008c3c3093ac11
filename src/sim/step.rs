/// The step function: advances the world by one frame of `dt` seconds.
///
/// Processing order:
///   1. Pause toggle
///   2. Movement (facing always updates, position only if open)
///   3. Trigger table + coin pickup, once per cell entered, matched
///      against logical tile ids rather than blink frames
///   4. Tile animations
///   5. Splash effects
///   6. Player walk cycle
///   7. Win / lose check
///
/// ## Phases
///
/// ┌──────────┬───────┬──────────┬────────────┬──────────┐
/// │ State    │ Input │ Triggers │ Animations │ Clock    │
/// ├──────────┼───────┼──────────┼────────────┼──────────┤
/// │ Playing  │ yes   │ yes      │ yes        │ runs     │
/// │ Paused   │ pause │ no       │ no         │ stopped  │
/// │ Won/Lost │ no    │ no       │ yes        │ frozen   │
/// └──────────┴───────┴──────────┴────────────┴──────────┘
///
/// Losing is checked before winning, so a hazard on the goal cell ends
/// the run as a loss.

use crate::domain::entity::{Direction, FrameInput};
use crate::domain::rules::{self, MoveOutcome};
use super::event::GameEvent;
use super::triggers;
use super::world::{GameState, Outcome};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(state: &mut GameState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    tick_message(state, dt);

    if input.toggle_pause && state.outcome == Outcome::Playing {
        state.paused = !state.paused;
        if state.paused {
            state.set_message("PAUSED", 0.0);
            events.push(GameEvent::Paused);
        } else {
            state.message.clear();
            events.push(GameEvent::Resumed);
        }
    }
    if state.paused {
        return events;
    }

    if state.outcome.is_terminal() {
        resolve_animations(state, dt, &mut events);
        return events;
    }

    state.clock += f64::from(dt);

    if let Some(dir) = input.movement {
        resolve_movement(state, dir, &mut events);
    }
    if state.last_evaluated != Some(state.player.pos) {
        triggers::evaluate(state, &mut events);
    }
    resolve_animations(state, dt, &mut events);
    resolve_outcome(state, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Stages
// ══════════════════════════════════════════════════════════════

fn tick_message(state: &mut GameState, dt: f32) {
    if state.message_timer > 0.0 {
        state.message_timer -= dt;
        if state.message_timer <= 0.0 {
            state.message_timer = 0.0;
            state.message.clear();
        }
    }
}

fn resolve_movement(state: &mut GameState, dir: Direction, events: &mut Vec<GameEvent>) {
    state.player.face(dir);
    let from = state.player.pos;
    let outcome = rules::attempt_move(&state.barriers, from, dir);
    match outcome {
        MoveOutcome::Moved(to) => events.push(GameEvent::Stepped { to }),
        MoveOutcome::Blocked(at) => {
            tracing::trace!("bumped into {at}");
            events.push(GameEvent::Bumped { at });
        }
        MoveOutcome::Stayed => {}
    }
    state.player.pos = outcome.resolve(from);
}

fn resolve_animations(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    for at in state.animator.tick(&mut state.tiles, dt) {
        events.push(GameEvent::TileSettled { at });
    }
    state.effects.retain_mut(|e| !e.tick(dt));
    state.player.animate(dt, state.anim.walk_fps, state.anim.idle_after);
}

fn resolve_outcome(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let outcome = if state.lives == 0 {
        Outcome::Lost
    } else if state.player.pos == state.goal {
        Outcome::Won
    } else {
        return;
    };

    state.outcome = outcome;
    state.finished_at = Some(state.clock);
    match outcome {
        Outcome::Lost => {
            tracing::info!("game over after {:.1}s, score {}", state.clock, state.score);
            state.set_message("GAME OVER", 0.0);
            events.push(GameEvent::Lost);
        }
        _ => {
            tracing::info!("goal reached after {:.1}s, score {}", state.clock, state.score);
            state.set_message("YOU WIN!", 0.0);
            events.push(GameEvent::Won);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::collectible::Coin;
    use crate::domain::grid::{Grid, GridPos};
    use crate::domain::tile;
    use crate::sim::level::LevelScript;
    use crate::sim::triggers::{Action, Condition, Trigger};

    const DT: f32 = 1.0 / 60.0;

    fn world(lives: u32) -> GameState {
        let mut cfg = GameConfig::default();
        cfg.rules.lives = lives;
        let mut tiles = Grid::standard();
        let mut barriers = Grid::standard();
        tiles.set(GridPos::new(1, 0), tile::LAVA);
        tiles.set(GridPos::new(0, 3), tile::ROCK);
        barriers.set(GridPos::new(0, 3), 1);
        let script = LevelScript {
            spawn: GridPos::new(0, 0),
            goal: GridPos::new(0, 2),
            coins: vec![Coin::new(GridPos::new(1, 1), true)],
            triggers: vec![Trigger::new("lava", Condition::OnTile(tile::LAVA), Action::Hazard)],
        };
        GameState::from_parts(tiles, barriers, script, cfg.rules, cfg.anim)
    }

    fn press(dir: Direction) -> FrameInput {
        FrameInput { movement: Some(dir), toggle_pause: false }
    }

    fn pause() -> FrameInput {
        FrameInput { movement: None, toggle_pause: true }
    }

    #[test]
    fn step_moves_and_reports() {
        let mut s = world(3);
        let events = step(&mut s, press(Direction::SouthWest), DT);
        assert_eq!(s.player.pos, GridPos::new(0, 1));
        assert_eq!(events[0], GameEvent::Stepped { to: GridPos::new(0, 1) });
        assert_eq!(s.player.facing, Direction::SouthWest);
    }

    #[test]
    fn blocked_step_still_turns_the_player() {
        let mut s = world(3);
        s.player.pos = GridPos::new(0, 2);
        s.goal = GridPos::new(14, 14);
        let events = step(&mut s, press(Direction::SouthWest), DT);
        assert_eq!(s.player.pos, GridPos::new(0, 2));
        assert_eq!(s.player.facing, Direction::SouthWest);
        assert!(events.contains(&GameEvent::Bumped { at: GridPos::new(0, 3) }));
    }

    #[test]
    fn edge_press_is_silent() {
        let mut s = world(3);
        let events = step(&mut s, press(Direction::North), DT);
        assert_eq!(s.player.pos, GridPos::new(0, 0));
        assert_eq!(s.player.facing, Direction::North);
        assert!(events.iter().all(|e| !matches!(e, GameEvent::Stepped { .. } | GameEvent::Bumped { .. })));
    }

    #[test]
    fn coin_then_goal_wins() {
        let mut s = world(3);
        step(&mut s, press(Direction::SouthEast), DT);       // (1,0) lava
        assert_eq!(s.lives, 2);
        assert_eq!(s.player.pos, s.spawn);

        step(&mut s, press(Direction::South), DT);           // (1,1) coin
        assert_eq!(s.score, s.rules.coin_score);

        let events = step(&mut s, press(Direction::SouthWest), DT); // (1,2)
        assert_eq!(events, vec![GameEvent::Stepped { to: GridPos::new(1, 2) }]);
        let events = step(&mut s, press(Direction::West), DT);      // (0,3) wall
        assert_eq!(events, vec![GameEvent::Bumped { at: GridPos::new(0, 3) }]);
        let events = step(&mut s, press(Direction::NorthWest), DT); // (0,2) goal
        assert!(events.contains(&GameEvent::Won));
        assert_eq!(s.outcome, Outcome::Won);
        assert_eq!(s.finished_at, Some(s.clock));
    }

    #[test]
    fn last_life_on_lava_loses_and_freezes() {
        let mut s = world(1);
        let events = step(&mut s, press(Direction::SouthEast), DT);
        assert_eq!(s.lives, 0);
        assert_eq!(s.outcome, Outcome::Lost);
        assert!(events.contains(&GameEvent::LifeLost { at: GridPos::new(1, 0), lives: 0 }));
        assert_eq!(events.last(), Some(&GameEvent::Lost));

        // input ignored, clock frozen, splash still fades
        let clock = s.display_clock();
        for _ in 0..120 {
            let events = step(&mut s, press(Direction::SouthWest), DT);
            assert!(events.is_empty());
        }
        assert_eq!(s.player.pos, s.spawn);
        assert_eq!(s.display_clock(), clock);
        assert!(s.effects.is_empty());

        s.reset();
        step(&mut s, press(Direction::SouthWest), DT);
        assert_eq!(s.player.pos, GridPos::new(0, 1));
        assert_eq!(s.lives, 1);
    }

    #[test]
    fn standing_still_does_not_retrigger() {
        let mut s = world(3);
        s.triggers.push(Trigger::new(
            "stone",
            Condition::At(GridPos::new(0, 1)),
            Action::Swap { target: GridPos::new(5, 5), tile: tile::ROCK },
        ));
        step(&mut s, press(Direction::SouthWest), DT);
        for _ in 0..10 {
            step(&mut s, FrameInput::default(), DT);
        }
        assert_eq!(s.fired.len(), 1);
        assert_eq!(s.animator.len(), 1);
    }

    #[test]
    fn swap_settles_after_transition() {
        let mut s = world(3);
        s.triggers.push(Trigger::new(
            "stone",
            Condition::At(GridPos::new(0, 1)),
            Action::Swap { target: GridPos::new(5, 5), tile: tile::ROCK },
        ));
        step(&mut s, press(Direction::SouthWest), DT);
        let mut settled = false;
        for _ in 0..90 {
            let events = step(&mut s, FrameInput::default(), DT);
            settled |= events.contains(&GameEvent::TileSettled { at: GridPos::new(5, 5) });
        }
        assert!(settled);
        assert_eq!(s.tiles.get(GridPos::new(5, 5)), Some(tile::ROCK));
        assert!(s.animator.is_empty());
    }

    #[test]
    fn events_follow_the_move_and_animations_follow_events() {
        let mut s = world(3);
        s.anim.transition = 0.001;
        s.triggers.push(Trigger::new(
            "stone",
            Condition::At(GridPos::new(0, 1)),
            Action::Swap { target: GridPos::new(5, 5), tile: tile::ROCK },
        ));
        let events = step(&mut s, press(Direction::SouthWest), DT);
        assert_eq!(events, vec![
            GameEvent::Stepped { to: GridPos::new(0, 1) },
            GameEvent::TriggerFired { name: "stone".into(), target: GridPos::new(5, 5) },
            GameEvent::TileSettled { at: GridPos::new(5, 5) },
        ]);
    }

    #[test]
    fn cooled_lava_is_safe_while_it_blinks() {
        let mut s = world(3);
        let lava = GridPos::new(1, 0);
        s.triggers.push(Trigger::new(
            "stone",
            Condition::At(GridPos::new(0, 1)),
            Action::Swap { target: lava, tile: tile::PATH },
        ));
        step(&mut s, press(Direction::SouthWest), DT);
        for _ in 0..9 {
            step(&mut s, FrameInput::default(), DT);
        }
        let events = step(&mut s, press(Direction::East), DT);
        assert_eq!(s.tiles.get(lava), Some(tile::LAVA), "lava frame of the blink");
        assert_eq!(events, vec![GameEvent::Stepped { to: lava }]);
        assert_eq!(s.lives, 3);
        assert_eq!(s.player.pos, lava);
    }

    #[test]
    fn hidden_coin_is_revealed_collected_and_restored() {
        let cfg = GameConfig::default();
        let mut s = GameState::from_parts(
            Grid::standard(), Grid::standard(), LevelScript::embedded(), cfg.rules, cfg.anim,
        );
        let hidden = GridPos::new(4, 0);
        assert_eq!((s.coins.collected(), s.coins.total()), (0, 2));

        // along row 0 past the hidden coin, then down column 6 to the stone
        for _ in 0..6 {
            step(&mut s, press(Direction::SouthEast), DT);
        }
        assert_eq!(s.score, 0);
        let mut events = Vec::new();
        for _ in 0..4 {
            events.extend(step(&mut s, press(Direction::SouthWest), DT));
        }
        assert_eq!(s.player.pos, GridPos::new(6, 4));
        assert!(events.contains(&GameEvent::TriggerFired { name: "lucky_stone".into(), target: hidden }));
        assert_eq!((s.coins.collected(), s.coins.total()), (1, 3));

        // back up to the revealed coin
        for dir in [Direction::North, Direction::North, Direction::NorthEast, Direction::NorthEast] {
            step(&mut s, press(dir), DT);
        }
        assert_eq!(s.player.pos, hidden);
        assert_eq!(s.score, 2 * s.rules.coin_score);
        assert_eq!(s.coins.collected(), 2);

        s.reset();
        assert_eq!((s.coins.collected(), s.coins.total()), (0, 2));
        assert!(s.coins.active().all(|c| c.pos != hidden));
    }

    #[test]
    fn pause_stops_the_world() {
        let mut s = world(3);
        assert_eq!(step(&mut s, pause(), DT), vec![GameEvent::Paused]);
        let clock = s.clock;
        step(&mut s, press(Direction::SouthWest), DT);
        assert_eq!(s.player.pos, s.spawn);
        assert_eq!(s.clock, clock);

        assert_eq!(step(&mut s, pause(), DT), vec![GameEvent::Resumed]);
        step(&mut s, press(Direction::SouthWest), DT);
        assert_eq!(s.player.pos, GridPos::new(0, 1));
    }

    #[test]
    fn pause_is_ignored_after_the_end() {
        let mut s = world(1);
        step(&mut s, press(Direction::SouthEast), DT);
        assert_eq!(s.outcome, Outcome::Lost);
        assert!(step(&mut s, pause(), DT).is_empty());
        assert!(!s.paused);
    }

    #[test]
    fn clock_accumulates_while_playing() {
        let mut s = world(3);
        for _ in 0..60 {
            step(&mut s, FrameInput::default(), DT);
        }
        assert!((s.clock - 1.0).abs() < 1e-3);
    }
}
