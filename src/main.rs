/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{debug, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use config::{AudioConfig, GameConfig};
use domain::entity::ControlKind;
use sim::event::GameEvent;
use sim::interact::{handle_pointer, press_control};
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{screen_point, Renderer};
use ui::sound::{AudioError, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let (config, config_err) = match GameConfig::load() {
        Ok(cfg) => (cfg, None),
        Err(e) => {
            eprintln!("{e}; using defaults");
            (GameConfig::default(), Some(e))
        }
    };

    init_tracing(&config.log_file);
    if let Some(e) = config_err {
        warn!(error = %e, "config.toml ignored");
    }

    let mut rng = rand::thread_rng();
    let mut world = WorldState::new_session(&config, &mut rng);
    let mut renderer = Renderer::new(&config.view);

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = match open_audio(&config.audio) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(error = %e, "audio disabled");
            None
        }
    };

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }
    info!(ticks = world.tick, flags = ?world.flags, "session ended");
    println!("Thanks for playing Dungeon Escape!");
}

/// A missing music track leaves the effects working.
fn open_audio(audio: &AudioConfig) -> Result<SoundEngine, AudioError> {
    let mut engine = SoundEngine::new(audio)?;
    if let Err(e) = engine.start_music() {
        warn!(error = %e, "Failed to load background music");
    }
    Ok(engine)
}

/// Log to a file: stdout belongs to the renderer. RUST_LOG overrides the
/// default `info` filter. If the file cannot be created, logs are dropped.
fn init_tracing(log_file: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let writer = match File::create(log_file) {
        Ok(f) => BoxMakeWriter::new(Mutex::new(f)),
        Err(e) => {
            eprintln!("could not create log file {}: {e}", log_file.display());
            BoxMakeWriter::new(io::sink)
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .compact()
        .try_init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new(&config.gamepad);
    let mut rng = rand::thread_rng();

    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
            break;
        }
        if kb.resized {
            renderer.invalidate();
        }

        if kb.was_pressed(KeyCode::F(1)) {
            world.paused = !world.paused;
            debug!(paused = world.paused, "pause toggled");
        }
        if kb.was_pressed(KeyCode::F(2)) || gp.restart_pressed() {
            *world = WorldState::new_session(config, &mut rng);
            renderer.invalidate();
            last_tick = Instant::now();
        }

        if !world.paused {
            let events = dispatch_input(world, &kb, &gp);
            process_sound_events(sound, &events);
        }

        let now = Instant::now();
        let dt = now.duration_since(last_tick);
        if dt >= tick_rate {
            last_tick = now;
            // Paused time is dropped, so the golem does not jump on resume.
            if !world.paused {
                let events = step::step(world, dt);
                process_sound_events(sound, &events);
            }
        }

        renderer.set_gamepad_connected(gp.is_connected());
        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Clicks first, then keyboard, then gamepad. Each press is dispatched
/// against the world as left by the previous one.
fn dispatch_input(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> Vec<GameEvent> {
    let mut events = Vec::new();

    for &(col, row) in &kb.clicks {
        if let Some(p) = screen_point(&world.camera, col, row) {
            events.extend(handle_pointer(world, p));
        }
    }
    for control in kb.controls() {
        events.extend(press_control(world, control));
    }
    if let Some(dir) = gp.move_pressed() {
        events.extend(press_control(world, ControlKind::Move(dir)));
    }
    if gp.summon_pressed() {
        events.extend(press_control(world, ControlKind::SummonGolem));
    }

    events
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        debug!(?event, "game event");
    }
    let Some(sfx) = sound else { return };
    for event in events {
        match event {
            GameEvent::MoveBlocked { .. } | GameEvent::SummonIgnored => sfx.play_bump(),
            GameEvent::KeyPicked => sfx.play_key(),
            GameEvent::DoorUnlocked => sfx.play_unlock(),
            GameEvent::SummonUnlocked => sfx.play_spell(),
            GameEvent::GolemSpawned => sfx.play_summon(),
            GameEvent::DoorSmashed { .. } => sfx.play_smash(),
            GameEvent::GolemVanished => sfx.play_vanish(),
            GameEvent::PlayerMoved { .. } => {}
        }
    }
}

// ── Key Constants ──

const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
