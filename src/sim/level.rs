/// Level generation and restarts.
///
/// Every level is the classic arena (border walls + pillar lattice) with
/// randomly seeded Blocks. The level table only decides who lives in it
/// and which power-ups are buried:
///
///   | #  | Enemies                      | Buried power-ups          |
///   |----|------------------------------|---------------------------|
///   | 1  | 3 Low                        | Fire, ExtraBomb           |
///   | 2  | 2 Low, 2 Normal              | ExtraBomb, Speed          |
///   | 3  | 1 Low, 2 Normal, 1 High      | Fire, BombPass            |
///   | 4  | 2 Normal, 1 High, 1 ghost    | WallPass, Fire, Speed     |
///   | 5  | 2 Normal, 2 High, 1 ghost    | FlamePass, ExtraBomb, Fire|
///
/// "ghost" = a Normal enemy that drifts through Blocks.
///
/// Layout RNG is `StdRng::seed_from_u64(seed + level)`: the same config
/// always produces the same arenas.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::domain::entity::{Enemy, Intelligence, Player};
use crate::domain::explosion::DangerZone;
use crate::domain::grid::PLAYER_SPAWN;
use crate::domain::pathfinding::manhattan;
use crate::domain::tile::{CellKind, PowerUp};
use crate::sim::world::{Phase, WorldState};

/// Enemies never spawn closer than this to the player.
pub const MIN_SPAWN_DISTANCE: u32 = 4;
pub const INTRO_SECS: f32 = 2.0;

#[derive(Clone, Copy, Debug)]
pub struct EnemyKind {
    pub intelligence: Intelligence,
    pub can_pass_walls: bool,
}

pub struct LevelDef {
    pub name: &'static str,
    pub enemies: &'static [EnemyKind],
    pub power_ups: &'static [PowerUp],
}

const fn walker(intelligence: Intelligence) -> EnemyKind {
    EnemyKind { intelligence, can_pass_walls: false }
}

const fn ghost(intelligence: Intelligence) -> EnemyKind {
    EnemyKind { intelligence, can_pass_walls: true }
}

use Intelligence::{High, Low, Normal};

pub const LEVELS: &[LevelDef] = &[
    LevelDef {
        name: "Stage 1 - Open Field",
        enemies: &[walker(Low), walker(Low), walker(Low)],
        power_ups: &[PowerUp::Fire, PowerUp::ExtraBomb],
    },
    LevelDef {
        name: "Stage 2 - Patrol",
        enemies: &[walker(Low), walker(Low), walker(Normal), walker(Normal)],
        power_ups: &[PowerUp::ExtraBomb, PowerUp::Speed],
    },
    LevelDef {
        name: "Stage 3 - Hunters",
        enemies: &[walker(Low), walker(Normal), walker(Normal), walker(High)],
        power_ups: &[PowerUp::Fire, PowerUp::BombPass],
    },
    LevelDef {
        name: "Stage 4 - Ghosts",
        enemies: &[walker(Normal), walker(Normal), walker(High), ghost(Normal)],
        power_ups: &[PowerUp::WallPass, PowerUp::Fire, PowerUp::Speed],
    },
    LevelDef {
        name: "Stage 5 - Last Stand",
        enemies: &[walker(Normal), walker(Normal), walker(High), walker(High), ghost(Normal)],
        power_ups: &[PowerUp::FlamePass, PowerUp::ExtraBomb, PowerUp::Fire],
    },
];

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Player with the configured starting stats, on the spawn cell.
pub fn starting_player(config: &GameConfig) -> Player {
    let mut player = Player::new(PLAYER_SPAWN.0, PLAYER_SPAWN.1);
    player.bomb_capacity = config.bombs.start_capacity;
    player.bomb_range = config.bombs.start_range;
    player.step_interval = config.speed.player_step_secs;
    player
}

/// Build level `level_idx` into the world. Preserves score, lives and the
/// player's upgrades. Past the last level the game is complete.
pub fn load_level(world: &mut WorldState, level_idx: usize) {
    world.total_levels = LEVELS.len();
    let Some(def) = LEVELS.get(level_idx) else {
        world.phase = Phase::GameComplete;
        world.set_message("ALL STAGES CLEAR", 0.0);
        return;
    };

    world.current_level = level_idx;
    world.level_name = def.name.to_string();

    let seed = world.config.level.seed.wrapping_add(level_idx as u64);
    let mut rng = StdRng::seed_from_u64(seed);

    let grid = &mut world.grid;
    grid.reset();
    grid.setup_classic_pattern();
    let blocks = grid.place_blocks(world.config.level.density, &mut rng);
    let exit = grid.hide_exit(&mut rng);
    let buried = grid.hide_power_ups(def.power_ups, &mut rng);
    if buried < def.power_ups.len() {
        warn!("Level {}: only {buried} of {} power-ups buried", level_idx + 1, def.power_ups.len());
    }

    world.enemies = spawn_enemies(world, def.enemies, &mut rng);

    world.player.x = PLAYER_SPAWN.0;
    world.player.y = PLAYER_SPAWN.1;
    world.player.alive = true;
    world.player.move_cooldown = 0.0;

    world.danger = DangerZone::empty(world.grid.width(), world.grid.height());
    world.tick = 0;
    world.phase = Phase::LevelIntro;
    world.phase_timer = INTRO_SECS;
    world.set_message(def.name, INTRO_SECS);

    info!(
        "Loaded level {} ({}): seed {seed}, {blocks} blocks, exit {:?}, {} enemies",
        level_idx + 1, def.name, exit, world.enemies.len(),
    );
}

/// After a death: same layout, no bombs or flames, everyone back at spawn.
/// The player loses their upgrades; enemies already destroyed stay gone.
pub fn restart_after_death(world: &mut WorldState) {
    world.grid.clear_dynamic_elements();
    world.player = starting_player(&world.config);
    for enemy in world.enemies.iter_mut().filter(|e| e.alive) {
        enemy.respawn();
    }
    world.danger = DangerZone::empty(world.grid.width(), world.grid.height());
    world.phase = Phase::LevelIntro;
    world.phase_timer = INTRO_SECS;
    let name = world.level_name.clone();
    world.set_message(&name, INTRO_SECS);
    info!("Restarting level {} with {} lives", world.current_level + 1, world.lives);
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn decision_interval(config: &GameConfig, intelligence: Intelligence) -> f32 {
    match intelligence {
        Intelligence::Low => config.ai.low_interval,
        Intelligence::Normal => config.ai.normal_interval,
        Intelligence::High => config.ai.high_interval,
    }
}

/// Place the roster on distinct Empty cells far enough from the spawn.
fn spawn_enemies(world: &WorldState, roster: &[EnemyKind], rng: &mut StdRng) -> Vec<Enemy> {
    let candidates: Vec<(usize, usize)> = world.grid
        .cells_of_type(CellKind::Empty)
        .map(|c| c.pos())
        .filter(|&p| manhattan(p, PLAYER_SPAWN) >= MIN_SPAWN_DISTANCE)
        .collect();
    if candidates.len() < roster.len() {
        warn!("Only {} spawn cells for {} enemies", candidates.len(), roster.len());
    }

    candidates
        .choose_multiple(rng, roster.len())
        .zip(roster)
        .enumerate()
        .map(|(id, (&(x, y), kind))| {
            Enemy::new(
                id, x, y,
                kind.intelligence,
                kind.can_pass_walls,
                decision_interval(&world.config, kind.intelligence),
                world.config.ai.enemy_step_secs,
            )
        })
        .collect()
}
