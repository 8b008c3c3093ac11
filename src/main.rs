/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing_subscriber::EnvFilter;

use config::{GameConfig, LogConfig};
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::level::load_level;
use sim::step;
use sim::world::GameState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{SoundEngine, Sfx};

/// Longest frame the simulation will take in one go, so a stall
/// (terminal resize, suspended process) does not skip animations.
const MAX_DT: f32 = 0.1;

fn main() {
    let (config, notes) = GameConfig::load();
    init_logging(&config.log);
    for note in &notes {
        tracing::info!("config: {note}");
    }

    let mut state = GameState::new(&config);
    load_level(&mut state, &config);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        tracing::error!("terminal init failed: {e}");
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut state, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        tracing::error!("game loop stopped: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Joguinho!");
    println!("Score: {}   Time: {:.1}s", state.score, state.display_clock());
}

/// The terminal belongs to the renderer, so logs go to a file.
/// `RUST_LOG` overrides the configured level.
fn init_logging(cfg: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match File::create(&cfg.file) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Err(e) => {
            eprintln!("cannot open log file {}: {e}; logging disabled", cfg.file.display());
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
    }
}

// ── Key Constants ──

const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p')];

enum Meta {
    Quit,
    Restart,
}

fn handle_meta(state: &GameState, kb: &InputState, gp: &GamepadState) -> Option<Meta> {
    if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
        return Some(Meta::Quit);
    }
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    if kb.any_pressed(KEYS_RESTART) || (confirm && state.outcome.is_terminal()) {
        return Some(Meta::Restart);
    }
    None
}

fn game_loop(
    state: &mut GameState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.reports_key_release();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let frame_sleep = Duration::from_millis(config.view.frame_ms);

    let mut last_frame = Instant::now();
    let mut fps = 0.0_f32;

    loop {
        kb.drain_events();
        gp.update();

        match handle_meta(state, &kb, &gp) {
            Some(Meta::Quit) => break,
            Some(Meta::Restart) => {
                tracing::info!("restart");
                load_level(state, config);
            }
            None => {}
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32().min(MAX_DT);
        last_frame = now;
        if dt > 0.0 {
            fps = fps * 0.9 + (1.0 / dt) * 0.1;
        }

        let input = FrameInput {
            movement: kb.movement().or(gp.movement()),
            toggle_pause: kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed(),
        };
        let events = step::step(state, input, dt);
        play_sounds(sound, &events);

        renderer.render(state, &config.view, fps)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

fn play_sounds(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for event in events {
        if let Some(cue) = Sfx::for_event(event) {
            sfx.play(cue);
        }
    }
}
