/// Entry point and game loop.

use std::fs::File;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use log::{debug, info};

use blastarena::config::GameConfig;
use blastarena::sim::event::GameEvent;
use blastarena::sim::level::{load_level, starting_player};
use blastarena::sim::step;
use blastarena::sim::world::{Phase, WorldState};
use blastarena::ui::input::{InputState, KEYS_CONFIRM, KEYS_QUIT};
use blastarena::ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "blastarena.log";

fn main() {
    init_logging();
    let config = GameConfig::load();
    info!("Starting with {config:?}");

    let mut world = WorldState::new(config);
    let mut renderer = Renderer::new();

    let key_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };
    debug!("Key release events: {key_release}");

    let result = game_loop(&mut world, &mut renderer, key_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Blast Arena!");
    println!("Final Score: {}", world.score);
}

/// The terminal is in raw mode while playing, so log lines go to a file.
/// `RUST_LOG` picks the level (default: info).
fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match File::create(LOG_FILE) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    key_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = key_release;
    let tick_rate = Duration::from_millis(world.config.speed.tick_rate_ms);
    let mut last_tick = Instant::now();
    let mut bomb_queued = false;

    loop {
        kb.drain_events();
        if kb.ctrl_c_pressed() { break; }
        if handle_meta(world, renderer, &kb) { break; }

        // Bomb presses between ticks are kept for the next tick.
        if world.phase == Phase::Playing && !world.paused {
            let input = kb.frame_input();
            bomb_queued |= input.place_bomb;
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            last_tick = Instant::now();
            let dt = elapsed.as_secs_f32().min(0.25);
            if !world.paused {
                if world.phase == Phase::Playing {
                    let mut input = kb.frame_input();
                    input.place_bomb = std::mem::take(&mut bomb_queued);
                    let events = step::step(world, input, dt);
                    log_events(&events);
                }
                step::tick_phase(world, dt);
            }
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::PlayerKilled | GameEvent::LevelCleared => info!("{event:?}"),
            _ => debug!("{event:?}"),
        }
    }
}

/// Start a new game from level 0.
fn start_new_game(world: &mut WorldState) {
    world.score = 0;
    world.lives = world.config.level.start_lives;
    world.player = starting_player(&world.config);
    world.paused = false;
    load_level(world, 0);
}

fn return_to_title(world: &mut WorldState) {
    world.phase = Phase::Title;
    world.paused = false;
    world.message.clear();
    world.message_timer = 0.0;
}

/// Menu keys and phase shortcuts. Returns true to quit.
fn handle_meta(world: &mut WorldState, renderer: &mut Renderer, kb: &InputState) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.any_pressed(&[KeyCode::Esc]);
    let in_game = matches!(
        world.phase,
        Phase::Playing | Phase::LevelIntro | Phase::Dying | Phase::LevelComplete
    );

    if in_game {
        if kb.any_pressed(&[KeyCode::F(1)]) {
            world.paused = !world.paused;
            return false;
        }
        if kb.any_pressed(&[KeyCode::F(2)]) {
            renderer.show_danger = !renderer.show_danger;
            return false;
        }
        if esc {
            info!("Back to title from level {}", world.current_level + 1);
            return_to_title(world);
            return false;
        }
    }

    match world.phase {
        Phase::Title => {
            if confirm || kb.any_pressed(&[KeyCode::Char(' ')]) {
                start_new_game(world);
            } else if esc || kb.any_pressed(KEYS_QUIT) {
                return true;
            }
        }
        Phase::LevelIntro => {
            // Skip the intro.
            if confirm {
                world.phase_timer = 0.0;
            }
        }
        Phase::GameOver => {
            if confirm {
                start_new_game(world);
            } else if esc {
                return_to_title(world);
            }
        }
        Phase::GameComplete => {
            if confirm || esc {
                return_to_title(world);
                world.set_message(&format!("Final score {}", world.score), 0.0);
            }
        }
        Phase::Playing | Phase::Dying | Phase::LevelComplete => {}
    }
    false
}
