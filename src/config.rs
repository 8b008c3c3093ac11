/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.
///
/// Logging is configured by this file, so problems found while loading
/// it are handed back as notes and logged once the subscriber is up.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::tile::{self, TileId};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub map: MapConfig,
    pub rules: RulesConfig,
    pub anim: AnimConfig,
    pub view: ViewConfig,
    pub gamepad: GamepadConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug)]
pub struct MapConfig {
    pub tiles: PathBuf,
    pub barriers: PathBuf,
    /// Level script: spawn, goal, coins and triggers.
    pub script: PathBuf,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub lives: u32,
    pub coin_score: u32,
    /// Tile a coin's cell turns into once collected.
    pub collected_tile: TileId,
}

#[derive(Clone, Debug)]
pub struct AnimConfig {
    pub walk_fps: f32,
    pub idle_after: f32,   // seconds without a press before the walk cycle stops
    pub transition: f32,   // tile swap duration
    pub blink: f32,        // tile swap flicker interval
    pub splash: f32,       // lava splash lifetime
}

#[derive(Clone, Debug)]
pub struct ViewConfig {
    /// Diamond width in terminal columns.
    pub tile_w: f32,
    /// Diamond height in terminal rows.
    pub tile_h: f32,
    pub frame_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub pause: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: PathBuf,
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    map: TomlMap,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    anim: TomlAnim,
    #[serde(default)]
    view: TomlView,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlMap {
    #[serde(default = "default_tiles_path")]
    tiles: String,
    #[serde(default = "default_barriers_path")]
    barriers: String,
    #[serde(default = "default_script_path")]
    script: String,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_coin_score")]
    coin_score: u32,
    #[serde(default = "default_collected_tile")]
    collected_tile: TileId,
}

#[derive(Deserialize, Debug)]
struct TomlAnim {
    #[serde(default = "default_walk_fps")]
    walk_fps: f32,
    #[serde(default = "default_idle_after")]
    idle_after: f32,
    #[serde(default = "default_transition")]
    transition: f32,
    #[serde(default = "default_blink")]
    blink: f32,
    #[serde(default = "default_splash")]
    splash: f32,
}

#[derive(Deserialize, Debug)]
struct TomlView {
    #[serde(default = "default_tile_w")]
    tile_w: f32,
    #[serde(default = "default_tile_h")]
    tile_h: f32,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_tiles_path() -> String { "assets/maps/mapa.txt".into() }
fn default_barriers_path() -> String { "assets/maps/barreiras.txt".into() }
fn default_script_path() -> String { "assets/maps/level.toml".into() }

fn default_lives() -> u32 { 3 }
fn default_coin_score() -> u32 { 10 }
fn default_collected_tile() -> TileId { tile::DUG }

fn default_walk_fps() -> f32 { 12.0 }
fn default_idle_after() -> f32 { 0.4 }
fn default_transition() -> f32 { 1.0 }
fn default_blink() -> f32 { 0.08 }
fn default_splash() -> f32 { 0.6 }

fn default_tile_w() -> f32 { 4.0 }
fn default_tile_h() -> f32 { 2.0 }
fn default_frame_ms() -> u64 { 16 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_pause() -> Vec<String> { vec!["Y".into()] }

fn default_log_file() -> String { "joguinho.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlMap {
    fn default() -> Self {
        TomlMap {
            tiles: default_tiles_path(),
            barriers: default_barriers_path(),
            script: default_script_path(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            lives: default_lives(),
            coin_score: default_coin_score(),
            collected_tile: default_collected_tile(),
        }
    }
}

impl Default for TomlAnim {
    fn default() -> Self {
        TomlAnim {
            walk_fps: default_walk_fps(),
            idle_after: default_idle_after(),
            transition: default_transition(),
            blink: default_blink(),
            splash: default_splash(),
        }
    }
}

impl Default for TomlView {
    fn default() -> Self {
        TomlView {
            tile_w: default_tile_w(),
            tile_h: default_tile_h(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            pause: default_pause(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Returns the config plus any warnings worth logging.
    pub fn load() -> (Self, Vec<String>) {
        let search_dirs = candidate_dirs();
        let (toml_cfg, notes) = load_toml(&search_dirs);
        (GameConfig::from_toml(toml_cfg, &search_dirs), notes)
    }

    /// Parse config text. Relative paths are kept as written.
    #[cfg(test)]
    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            map: MapConfig {
                tiles: resolve_path(search_dirs, &cfg.map.tiles),
                barriers: resolve_path(search_dirs, &cfg.map.barriers),
                script: resolve_path(search_dirs, &cfg.map.script),
            },
            rules: RulesConfig {
                lives: cfg.rules.lives.max(1),
                coin_score: cfg.rules.coin_score,
                collected_tile: cfg.rules.collected_tile,
            },
            anim: AnimConfig {
                walk_fps: cfg.anim.walk_fps.max(0.0),
                idle_after: cfg.anim.idle_after.max(0.0),
                transition: cfg.anim.transition.max(0.0),
                blink: cfg.anim.blink.max(0.0),
                splash: cfg.anim.splash.max(0.0),
            },
            view: ViewConfig {
                tile_w: cfg.view.tile_w.max(2.0),
                tile_h: cfg.view.tile_h.max(1.0),
                frame_ms: cfg.view.frame_ms.max(1),
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                pause: cfg.gamepad.pause,
            },
            log: LogConfig {
                file: PathBuf::from(cfg.log.file),
                level: cfg.log.level,
            },
        }
    }
}

/// Resolve an asset path: absolute as-is, otherwise the first candidate
/// directory where it exists, otherwise relative to the CWD.
fn resolve_path(search_dirs: &[PathBuf], raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(path))
        .find(|p| p.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> (TomlConfig, Vec<String>) {
    let mut notes = Vec::new();
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    notes.push(format!("using {}", path.display()));
                    return (cfg, notes);
                }
                Err(e) => {
                    notes.push(format!("{} parse error, using defaults: {e}", path.display()));
                    return (TomlConfig::default(), notes);
                }
            },
            Err(e) => notes.push(format!("could not read {}: {e}", path.display())),
        }
    }
    (TomlConfig::default(), notes)
}
