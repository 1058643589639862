/// WorldState: the complete snapshot of a running game.
///
/// ## Ownership
///
///   - `grid`: every Cell and every Bomb (bombs live in a slot arena
///     on the grid; cells refer to them by `BombId`).
///   - `player`, `enemies`: plain values, positioned by grid coordinates.
///   - `ai`: the enemy controller and its random source.
///
/// The layout of level N is generated from `config.level.seed + N`, so a
/// restart after death keeps walls and blocks exactly as they were.

use crate::config::GameConfig;
use crate::domain::ai::EnemyAi;
use crate::domain::entity::{Enemy, Player};
use crate::domain::explosion::DangerZone;
use crate::domain::grid::{Grid, DEFAULT_HEIGHT, DEFAULT_WIDTH, PLAYER_SPAWN};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    LevelIntro,
    Playing,
    Dying,
    LevelComplete,
    GameOver,
    GameComplete,
}

pub struct WorldState {
    // ── Arena ──
    pub grid: Grid,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub ai: EnemyAi,
    /// Snapshot the AI decided against this tick. Read by the renderer.
    pub danger: DangerZone,

    pub config: GameConfig,

    // ── Meta ──
    pub phase: Phase,
    pub score: u32,
    pub lives: u32,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub tick: u64,
    /// Countdown for timed phases (intro, dying, level complete).
    pub phase_timer: f32,
    pub paused: bool,

    // ── UI ──
    pub message: String,
    pub message_timer: f32,
}

impl WorldState {
    pub fn new(config: GameConfig) -> Self {
        Self::with_ai(config, EnemyAi::new())
    }

    /// Same as `new` with an explicit controller (seeded in tests).
    pub fn with_ai(config: GameConfig, ai: EnemyAi) -> Self {
        let lives = config.level.start_lives;
        WorldState {
            grid: Grid::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            player: Player::new(PLAYER_SPAWN.0, PLAYER_SPAWN.1),
            enemies: vec![],
            ai,
            danger: DangerZone::empty(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            config,
            phase: Phase::Title,
            score: 0,
            lives,
            current_level: 0,
            total_levels: 0,
            level_name: String::new(),
            tick: 0,
            phase_timer: 0.0,
            paused: false,
            message: String::new(),
            message_timer: 0.0,
        }
    }

    /// Show `msg` for `secs` seconds; zero keeps it until replaced.
    pub fn set_message(&mut self, msg: &str, secs: f32) {
        self.message = msg.to_string();
        self.message_timer = secs;
    }

    pub fn tick_message(&mut self, dt: f32) {
        if self.message_timer <= 0.0 { return; }
        self.message_timer -= dt;
        if self.message_timer <= 0.0 {
            self.message_timer = 0.0;
            self.message.clear();
        }
    }

    pub fn enemies_alive(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    pub fn enemy_at(&self, x: usize, y: usize) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.alive && e.x == x && e.y == y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_world_starts_on_title() {
        let world = WorldState::with_ai(GameConfig::default(), EnemyAi::with_seed(1));
        assert_eq!(world.phase, Phase::Title);
        assert_eq!(world.lives, GameConfig::default().level.start_lives);
        assert_eq!((world.player.x, world.player.y), PLAYER_SPAWN);
    }

    #[test]
    fn timed_message_expires() {
        let mut world = WorldState::with_ai(GameConfig::default(), EnemyAi::with_seed(1));
        world.set_message("hello", 0.5);
        world.tick_message(0.25);
        assert_eq!(world.message, "hello");
        world.tick_message(0.3);
        assert!(world.message.is_empty());
    }

    #[test]
    fn sticky_message_stays() {
        let mut world = WorldState::with_ai(GameConfig::default(), EnemyAi::with_seed(1));
        world.set_message("PAUSED", 0.0);
        world.tick_message(10.0);
        assert_eq!(world.message, "PAUSED");
    }
}
