/// Level loader: map grids plus the level script.
///
/// ## Sources
///   - tile grid    `assets/maps/mapa.txt`      (see `domain::grid`)
///   - barrier grid `assets/maps/barreiras.txt`
///   - script       `assets/maps/level.toml`, or the embedded script
///
/// ## Script format (`level.toml`):
///   ```toml
///   spawn = [0, 0]
///   goal = [1, 13]
///
///   [[coin]]
///   at = [6, 2]
///   active = true          # optional, default true
///
///   [[trigger]]
///   name = "lava"
///   on_tile = 3            # or: at = [x, y]
///   effect = "hazard"      # hazard | unlock | block | swap | reveal
///
///   [[trigger]]
///   name = "gate_button"
///   at = [3, 7]
///   effect = "unlock"
///   target = [2, 8]        # required except for hazard
///   tile = 0               # required for unlock, block and swap
///
///   [[trigger]]
///   name = "lucky_stone"
///   at = [6, 4]
///   effect = "reveal"      # turns on the hidden coin at `target`
///   target = [4, 0]
///   ```
///
/// Nothing here aborts the game: a broken grid file keeps the previous
/// grid, a broken script falls back to the embedded one.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::collectible::Coin;
use crate::domain::grid::{GridPos, GRID_H, GRID_W};
use crate::domain::tile::{self, TileId};
use super::triggers::{Action, Condition, Trigger};
use super::world::GameState;

/// Everything about a level that is not a grid.
#[derive(Clone, Debug)]
pub struct LevelScript {
    pub spawn: GridPos,
    pub goal: GridPos,
    pub coins: Vec<Coin>,
    pub triggers: Vec<Trigger>,
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("could not read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid script: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{what} at ({x},{y}) is outside the map")]
    OutOfRange { what: String, x: usize, y: usize },
    #[error("trigger {trigger:?} needs `{field}`")]
    MissingField { trigger: String, field: &'static str },
    #[error("trigger {trigger:?} needs exactly one of `at` or `on_tile`")]
    Condition { trigger: String },
    #[error("trigger name {0:?} is used twice")]
    DuplicateName(String),
}

// ── TOML schema ──

#[derive(Deserialize, Debug)]
struct TomlScript {
    #[serde(default)]
    spawn: [usize; 2],
    goal: [usize; 2],
    #[serde(default, rename = "coin")]
    coins: Vec<TomlCoin>,
    #[serde(default, rename = "trigger")]
    triggers: Vec<TomlTrigger>,
}

#[derive(Deserialize, Debug)]
struct TomlCoin {
    at: [usize; 2],
    #[serde(default = "default_active")]
    active: bool,
}

#[derive(Deserialize, Debug)]
struct TomlTrigger {
    name: String,
    at: Option<[usize; 2]>,
    on_tile: Option<TileId>,
    effect: TomlEffect,
    target: Option<[usize; 2]>,
    tile: Option<TileId>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum TomlEffect {
    Hazard,
    Unlock,
    Block,
    Swap,
    Reveal,
}

fn default_active() -> bool { true }

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// (Re)load grids and script from disk and restart the run.
///
/// Grids start from the last loaded copy (all zeros on first load),
/// so a missing or broken file leaves that grid as it was.
pub fn load_level(state: &mut GameState, config: &GameConfig) {
    let mut tiles = state.base_tiles.clone();
    match tiles.load(&config.map.tiles) {
        Ok(()) => tracing::debug!("tile map {}:\n{tiles}", config.map.tiles.display()),
        Err(e) => tracing::warn!("{e}; keeping previous tile map"),
    }

    let mut barriers = state.base_barriers.clone();
    match barriers.load(&config.map.barriers) {
        Ok(()) => tracing::debug!("barrier map {}:\n{barriers}", config.map.barriers.display()),
        Err(e) => tracing::warn!("{e}; keeping previous barrier map"),
    }

    let script = load_script(&config.map.script);
    tracing::info!(
        "level loaded: {} triggers, {} coins, goal {}",
        script.triggers.len(), script.coins.len(), script.goal
    );
    state.install(tiles, barriers, script);
}

/// Script from `path`, or the embedded one if it is missing or broken.
pub fn load_script(path: &Path) -> LevelScript {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("no level script at {}, using the built-in one", path.display());
            return LevelScript::embedded();
        }
        Err(source) => {
            let e = ScriptError::Io { path: path.to_path_buf(), source };
            tracing::warn!("{e}; using the built-in script");
            return LevelScript::embedded();
        }
    };
    match parse_script(&text) {
        Ok(script) => script,
        Err(e) => {
            tracing::warn!("{}: {e}; using the built-in script", path.display());
            LevelScript::embedded()
        }
    }
}

/// Parse and validate script text.
pub fn parse_script(text: &str) -> Result<LevelScript, ScriptError> {
    let raw: TomlScript = toml::from_str(text)?;

    let spawn = cell("spawn", raw.spawn)?;
    let goal = cell("goal", raw.goal)?;

    let coins = raw.coins.iter()
        .map(|c| Ok(Coin::new(cell("coin", c.at)?, c.active)))
        .collect::<Result<Vec<_>, ScriptError>>()?;

    let mut triggers: Vec<Trigger> = Vec::with_capacity(raw.triggers.len());
    for t in &raw.triggers {
        if triggers.iter().any(|seen| seen.name == t.name) {
            return Err(ScriptError::DuplicateName(t.name.clone()));
        }
        triggers.push(parse_trigger(t)?);
    }

    Ok(LevelScript { spawn, goal, coins, triggers })
}

fn parse_trigger(t: &TomlTrigger) -> Result<Trigger, ScriptError> {
    let when = match (t.at, t.on_tile) {
        (Some(at), None) => Condition::At(cell(&format!("trigger {:?}", t.name), at)?),
        (None, Some(id)) => Condition::OnTile(id),
        _ => return Err(ScriptError::Condition { trigger: t.name.clone() }),
    };

    let action = match t.effect {
        TomlEffect::Hazard => Action::Hazard,
        effect => {
            let target = t.target.ok_or_else(|| missing(t, "target"))?;
            let target = cell(&format!("target of {:?}", t.name), target)?;
            if let TomlEffect::Reveal = effect {
                Action::RevealCoin { at: target }
            } else {
                let tile = t.tile.ok_or_else(|| missing(t, "tile"))?;
                match effect {
                    TomlEffect::Unlock => Action::Unlock { target, tile },
                    TomlEffect::Block => Action::Block { target, tile },
                    _ => Action::Swap { target, tile },
                }
            }
        }
    };

    Ok(Trigger { name: t.name.clone(), when, action })
}

fn missing(t: &TomlTrigger, field: &'static str) -> ScriptError {
    ScriptError::MissingField { trigger: t.name.clone(), field }
}

fn cell(what: &str, [x, y]: [usize; 2]) -> Result<GridPos, ScriptError> {
    if x < GRID_W && y < GRID_H {
        Ok(GridPos::new(x, y))
    } else {
        Err(ScriptError::OutOfRange { what: what.to_string(), x, y })
    }
}

impl LevelScript {
    /// The stock level: three coins (the first starts hidden until the
    /// stone at (6,4) reveals it), lava everywhere it appears, and the
    /// button at (3,7) that opens the gate at (2,8) to the portal.
    pub fn embedded() -> Self {
        LevelScript {
            spawn: GridPos::new(0, 0),
            goal: GridPos::new(1, 13),
            coins: vec![
                Coin::new(GridPos::new(4, 0), false),
                Coin::new(GridPos::new(6, 2), true),
                Coin::new(GridPos::new(7, 13), true),
            ],
            triggers: vec![
                Trigger::new("lava", Condition::OnTile(tile::LAVA), Action::Hazard),
                Trigger::new(
                    "gate_button",
                    Condition::At(GridPos::new(3, 7)),
                    Action::Unlock { target: GridPos::new(2, 8), tile: tile::GRASS },
                ),
                Trigger::new(
                    "lucky_stone",
                    Condition::At(GridPos::new(6, 4)),
                    Action::RevealCoin { at: GridPos::new(4, 0) },
                ),
            ],
        }
    }
}
