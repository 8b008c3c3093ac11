/// GameState: the complete snapshot of a running game.
///
/// ## Grid layers
///
/// Two pairs of grids:
///   - `base_tiles` / `base_barriers`: as loaded from disk. Only
///     replaced by a (re)load, never touched by gameplay.
///   - `tiles` / `barriers`: the live map, mutated by triggers and
///     tile animations. While a cell blinks, `tiles` holds whichever
///     frame is showing; `logical_tile` gives the id rules act on.
///
/// `reset()` copies the base layers back and clears every other piece
/// of run state, which is what restart means.
///
/// ## One-shot triggers
///
/// `fired` holds the names of triggers that already went off. Names
/// enter it once and leave only through `reset()`.

use std::collections::HashSet;

use crate::config::{AnimConfig, GameConfig, RulesConfig};
use crate::domain::anim::Animator;
use crate::domain::collectible::CoinRegistry;
use crate::domain::entity::{Effect, Player};
use crate::domain::grid::{Grid, GridPos};
use crate::domain::tile::TileId;
use super::level::LevelScript;
use super::triggers::Trigger;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Playing,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Playing)
    }
}

pub struct GameState {
    // ── Map ──
    pub base_tiles: Grid,
    pub base_barriers: Grid,
    pub tiles: Grid,
    pub barriers: Grid,

    // ── Level script ──
    pub spawn: GridPos,
    pub goal: GridPos,
    pub triggers: Vec<Trigger>,

    // ── Run state ──
    pub player: Player,
    pub coins: CoinRegistry,
    pub animator: Animator,
    pub effects: Vec<Effect>,
    pub fired: HashSet<String>,
    /// Cell the trigger table last ran for; triggers run again only
    /// after the player enters a different cell.
    pub last_evaluated: Option<GridPos>,

    // ── Meta ──
    pub score: u32,
    pub lives: u32,
    pub outcome: Outcome,
    pub paused: bool,
    /// Seconds of unpaused play. Stops when the game ends.
    pub clock: f64,
    /// Clock value when the outcome became terminal.
    pub finished_at: Option<f64>,

    // ── UI ──
    pub message: String,
    pub message_timer: f32,

    // ── Tunables ──
    pub rules: RulesConfig,
    pub anim: AnimConfig,
}

impl GameState {
    /// An empty 15×15 world with the embedded level script.
    /// `level::load_level` fills in the real map.
    pub fn new(config: &GameConfig) -> Self {
        GameState::from_parts(
            Grid::standard(),
            Grid::standard(),
            LevelScript::embedded(),
            config.rules.clone(),
            config.anim.clone(),
        )
    }

    pub fn from_parts(
        tiles: Grid,
        barriers: Grid,
        script: LevelScript,
        rules: RulesConfig,
        anim: AnimConfig,
    ) -> Self {
        let mut state = GameState {
            base_tiles: tiles.clone(),
            base_barriers: barriers.clone(),
            tiles,
            barriers,
            spawn: script.spawn,
            goal: script.goal,
            triggers: script.triggers,
            player: Player::new(script.spawn),
            coins: CoinRegistry::new(script.coins),
            animator: Animator::new(),
            effects: Vec::new(),
            fired: HashSet::new(),
            last_evaluated: None,
            score: 0,
            lives: rules.lives,
            outcome: Outcome::Playing,
            paused: false,
            clock: 0.0,
            finished_at: None,
            message: String::new(),
            message_timer: 0.0,
            rules,
            anim,
        };
        state.open_spawn();
        state.reset();
        state
    }

    /// Swap in freshly loaded grids and script, then restart the run.
    pub fn install(&mut self, tiles: Grid, barriers: Grid, script: LevelScript) {
        self.base_tiles = tiles;
        self.base_barriers = barriers;
        self.spawn = script.spawn;
        self.goal = script.goal;
        self.triggers = script.triggers;
        self.coins = CoinRegistry::new(script.coins);
        self.open_spawn();
        self.reset();
    }

    /// Back to the first frame: map, player, triggers, coins,
    /// animations, lives, score, clock and outcome.
    pub fn reset(&mut self) {
        self.tiles = self.base_tiles.clone();
        self.barriers = self.base_barriers.clone();
        self.player = Player::new(self.spawn);
        self.coins.reset();
        self.animator.clear();
        self.effects.clear();
        self.fired.clear();
        self.last_evaluated = None;
        self.score = 0;
        self.lives = self.rules.lives;
        self.outcome = Outcome::Playing;
        self.paused = false;
        self.clock = 0.0;
        self.finished_at = None;
        self.message.clear();
        self.message_timer = 0.0;
    }

    /// The spawn cell must be walkable or the player starts stuck.
    fn open_spawn(&mut self) {
        if !self.base_barriers.is_open(self.spawn) && self.base_barriers.contains(self.spawn) {
            tracing::warn!("spawn {} sits on a barrier; clearing it", self.spawn);
            self.base_barriers.set(self.spawn, 0);
        }
    }

    /// The id a cell counts as for triggers: the end of any running
    /// animation there, else the live grid.
    pub fn logical_tile(&self, pos: GridPos) -> Option<TileId> {
        self.animator.settles_to(pos).or_else(|| self.tiles.get(pos))
    }

    /// Elapsed time to show: frozen once the game has ended.
    pub fn display_clock(&self) -> f64 {
        self.finished_at.unwrap_or(self.clock)
    }

    pub fn set_message(&mut self, msg: &str, seconds: f32) {
        self.message = msg.to_string();
        self.message_timer = seconds;
    }
}
