/// Event table: declarative map triggers.
///
/// Each `Trigger` pairs a condition on the player's cell with an action.
/// `evaluate` runs the whole table in declaration order against the
/// current cell, then checks coins.
///
/// ## Gating
///
/// ┌──────────┬──────────────────────────────────────┬───────────┐
/// │ Action   │ Effect                               │ One-shot? │
/// ├──────────┼──────────────────────────────────────┼───────────┤
/// │ Hazard   │ −1 life, splash, back to spawn       │ no        │
/// │ Unlock   │ barrier cleared, tile animates       │ yes       │
/// │ Block    │ barrier set, tile animates           │ yes       │
/// │ Swap     │ tile animates, barrier untouched     │ yes       │
/// │ Reveal   │ hidden coin becomes collectable      │ yes       │
/// │ (coin)   │ +score, tile animates                │ per coin  │
/// └──────────┴──────────────────────────────────────┴───────────┘
///
/// Conditions are matched against the cell before any action in the
/// same pass runs, so every trigger sharing the cell fires together.
/// `OnTile` looks at the cell's logical id (`GameState::logical_tile`),
/// never at a blink frame.

use crate::domain::anim::TileAnimation;
use crate::domain::entity::Effect;
use crate::domain::grid::GridPos;
use crate::domain::tile::TileId;
use super::event::GameEvent;
use super::world::GameState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Condition {
    /// Player stands on this cell.
    At(GridPos),
    /// Player stands on any cell whose tile is this id.
    OnTile(TileId),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Hazard,
    Unlock { target: GridPos, tile: TileId },
    Block { target: GridPos, tile: TileId },
    Swap { target: GridPos, tile: TileId },
    RevealCoin { at: GridPos },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    pub name: String,
    pub when: Condition,
    pub action: Action,
}

impl Trigger {
    pub fn new(name: &str, when: Condition, action: Action) -> Self {
        Trigger { name: name.to_string(), when, action }
    }

    /// Hazards hit every time; everything else fires once per run.
    pub fn is_one_shot(&self) -> bool {
        !matches!(self.action, Action::Hazard)
    }

    /// `tile` is the logical id of the player's cell.
    pub fn matches(&self, pos: GridPos, tile: Option<TileId>) -> bool {
        match self.when {
            Condition::At(cell) => cell == pos,
            Condition::OnTile(id) => tile == Some(id),
        }
    }
}

/// Run the trigger table and coin pickup for the player's cell.
pub fn evaluate(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let pos = state.player.pos;
    state.last_evaluated = Some(pos);
    let here = state.logical_tile(pos);

    let hits: Vec<usize> = state.triggers.iter()
        .enumerate()
        .filter(|(_, t)| t.matches(pos, here))
        .map(|(i, _)| i)
        .collect();

    for i in hits {
        let trigger = state.triggers[i].clone();
        if trigger.is_one_shot() && !state.fired.insert(trigger.name.clone()) {
            continue;
        }
        fire(state, &trigger, pos, events);
    }

    collect_coin(state, pos, events);
}

fn fire(state: &mut GameState, trigger: &Trigger, pos: GridPos, events: &mut Vec<GameEvent>) {
    match trigger.action {
        Action::Hazard => {
            state.lives = state.lives.saturating_sub(1);
            state.effects.push(Effect::new(pos, state.anim.splash));
            state.player.pos = state.spawn;
            tracing::info!("{} at {pos}: {} lives left", trigger.name, state.lives);
            events.push(GameEvent::LifeLost { at: pos, lives: state.lives });
        }
        Action::Unlock { target, tile } => {
            state.barriers.set(target, 0);
            animate_cell(state, target, tile);
            announce(trigger, target, events);
        }
        Action::Block { target, tile } => {
            state.barriers.set(target, 1);
            animate_cell(state, target, tile);
            announce(trigger, target, events);
        }
        Action::Swap { target, tile } => {
            animate_cell(state, target, tile);
            announce(trigger, target, events);
        }
        Action::RevealCoin { at } => {
            if !state.coins.activate(at) {
                tracing::warn!("trigger {}: no hidden coin at {at}", trigger.name);
                return;
            }
            announce(trigger, at, events);
        }
    }
}

fn collect_coin(state: &mut GameState, pos: GridPos, events: &mut Vec<GameEvent>) {
    if state.coins.try_collect(pos).is_none() {
        return;
    }
    state.score += state.rules.coin_score;
    let collected = state.rules.collected_tile;
    animate_cell(state, pos, collected);
    tracing::info!("coin at {pos}, score {}", state.score);
    events.push(GameEvent::CoinCollected { at: pos, score: state.score });
}

/// Start from the cell's logical id so a chained change never
/// blinks back to a stale frame.
fn animate_cell(state: &mut GameState, cell: GridPos, tile: TileId) {
    let mut anim = TileAnimation::new(&state.tiles, cell, tile, state.anim.transition, state.anim.blink);
    if let Some(id) = state.animator.settles_to(cell) {
        anim.start = id;
    }
    state.animator.push(anim);
}

fn announce(trigger: &Trigger, target: GridPos, events: &mut Vec<GameEvent>) {
    tracing::info!("trigger {} fired, {target} changes", trigger.name);
    events.push(GameEvent::TriggerFired { name: trigger.name.clone(), target });
}
