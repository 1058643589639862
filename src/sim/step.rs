/// The step function: advances the world by one tick of `dt` seconds.
///
/// Processing order:
///   1. Player movement (cooldown-gated tile steps)
///   2. Bomb placement
///   3. Fuses → detonation (chains resolved breadth-first)
///   4. Flame / crumble timers → reveals
///   5. Enemy AI + enemy motion (one danger snapshot for all)
///   6. Contact: flames and enemies vs. actors
///   7. Pickups and exit
///
/// Movement = grid walkability for the mover's capabilities.
/// Danger   = bomb blast paths ∪ burning cells.

use log::{debug, info};

use crate::domain::entity::{BombId, Direction, FrameInput};
use crate::domain::explosion;
use crate::domain::tile::CellKind;
use super::event::GameEvent;
use super::level::{load_level, restart_after_death};
use super::world::{Phase, WorldState};

pub const POWER_UP_POINTS: u32 = 50;
pub const LEVEL_CLEAR_POINTS: u32 = 1000;
pub const DYING_SECS: f32 = 1.5;
pub const CLEAR_SECS: f32 = 2.5;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    let before = Positions::capture(world);

    resolve_player_movement(world, input.movement, dt);
    resolve_bomb_placement(world, input.place_bomb, &mut events);
    resolve_fuses(world, dt, &mut events);
    resolve_timers(world, dt, &mut events);
    resolve_enemies(world, dt);
    if resolve_contacts(world, &before, &mut events) { return events; }
    resolve_pickups(world, &mut events);

    events
}

/// Timed phase transitions: intro → playing, dying → restart or game
/// over, level complete → next level.
pub fn tick_phase(world: &mut WorldState, dt: f32) {
    world.tick_message(dt);
    if !matches!(world.phase, Phase::LevelIntro | Phase::Dying | Phase::LevelComplete) {
        return;
    }
    world.phase_timer -= dt;
    if world.phase_timer > 0.0 { return; }
    world.phase_timer = 0.0;

    match world.phase {
        Phase::LevelIntro => {
            world.phase = Phase::Playing;
            world.message.clear();
        }
        Phase::Dying => {
            world.lives = world.lives.saturating_sub(1);
            if world.lives == 0 {
                info!("Game over at level {} with {} points", world.current_level + 1, world.score);
                world.phase = Phase::GameOver;
                world.set_message("GAME OVER", 0.0);
            } else {
                restart_after_death(world);
            }
        }
        Phase::LevelComplete => load_level(world, world.current_level + 1),
        _ => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut WorldState, movement: Option<Direction>, dt: f32) {
    if !world.player.alive { return; }
    world.player.advance(movement, dt, &world.grid);

    // Once the owner steps off, a bomb becomes solid for them too.
    let (px, py) = (world.player.x, world.player.y);
    let left_behind: Vec<BombId> = world.grid.active_bombs()
        .filter(|(_, b)| b.player_on_top && (b.x, b.y) != (px, py))
        .map(|(id, _)| id)
        .collect();
    for id in left_behind {
        if let Some(bomb) = world.grid.bomb_mut(id) {
            bomb.player_on_top = false;
        }
    }
}

fn resolve_bomb_placement(world: &mut WorldState, place: bool, events: &mut Vec<GameEvent>) {
    if !place || !world.player.alive { return; }
    let p = &world.player;
    if world.grid.active_bomb_count() >= p.bomb_capacity as usize { return; }

    let (x, y, range) = (p.x, p.y, p.bomb_range);
    if world.grid.place_bomb(x, y, range, world.config.bombs.fuse_secs).is_some() {
        debug!("Bomb placed at ({x}, {y}) range {range}");
        events.push(GameEvent::BombPlaced { x, y });
    }
}

// ══════════════════════════════════════════════════════════════
// Bombs and timers
// ══════════════════════════════════════════════════════════════

fn resolve_fuses(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let ids: Vec<BombId> = world.grid.active_bombs().map(|(id, _)| id).collect();
    let mut expired = Vec::new();
    for id in ids {
        let Some(bomb) = world.grid.bomb_mut(id) else { continue };
        let (x, y) = (bomb.x, bomb.y);
        let fuse_out = bomb.tick(dt);
        let in_flames = world.grid.get(x, y).map_or(false, |c| c.is_burning());
        if fuse_out || in_flames {
            expired.push(id);
        }
    }

    let flame = world.config.bombs.flame_secs;
    let crumble = world.config.bombs.block_destroy_secs;
    for id in expired {
        // Already gone if an earlier blast chained into it.
        if world.grid.bomb(id).is_none() { continue; }
        for blast in explosion::detonate(&mut world.grid, id, flame, crumble) {
            events.push(GameEvent::BombDetonated { x: blast.x, y: blast.y, cells: blast.cells.len() });
            for &(x, y, _) in &blast.power_ups_burned {
                events.push(GameEvent::PowerUpBurned { x, y });
            }
        }
    }
}

fn resolve_timers(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    for reveal in world.grid.tick_timers(dt) {
        let (x, y) = (reveal.x, reveal.y);
        events.push(GameEvent::BlockDestroyed { x, y });
        if reveal.exit {
            info!("Exit revealed at ({x}, {y})");
            events.push(GameEvent::ExitRevealed { x, y });
        }
        if let Some(power_up) = reveal.power_up {
            debug!("{power_up:?} revealed at ({x}, {y})");
            events.push(GameEvent::PowerUpRevealed { x, y, power_up });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemies(world: &mut WorldState, dt: f32) {
    world.danger = world.ai.tick(&mut world.enemies, &world.player, &world.grid, dt);
}

// ══════════════════════════════════════════════════════════════
// Contact
// ══════════════════════════════════════════════════════════════

/// Actor cells at the start of a tick.
struct Positions {
    player: (usize, usize),
    enemies: Vec<(usize, usize)>,
}

impl Positions {
    fn capture(world: &WorldState) -> Self {
        Positions {
            player: (world.player.x, world.player.y),
            enemies: world.enemies.iter().map(|e| e.pos()).collect(),
        }
    }
}

/// An enemy that traded cells with the player this tick.
fn swapped_with_player(world: &WorldState, before: &Positions) -> bool {
    let now = (world.player.x, world.player.y);
    world.enemies.iter()
        .zip(&before.enemies)
        .any(|(e, &was)| e.alive && was == now && e.pos() == before.player)
}

/// Returns true if the player died this tick.
fn resolve_contacts(world: &mut WorldState, before: &Positions, events: &mut Vec<GameEvent>) -> bool {
    for enemy in world.enemies.iter_mut().filter(|e| e.alive) {
        let burning = world.grid.get(enemy.x, enemy.y).map_or(false, |c| c.is_burning());
        if burning {
            enemy.alive = false;
            world.score += enemy.intelligence.points();
            debug!("Enemy {} ({:?}) destroyed at ({}, {})", enemy.id, enemy.intelligence, enemy.x, enemy.y);
            events.push(GameEvent::EnemyKilled { id: enemy.id, intelligence: enemy.intelligence });
        }
    }

    if !world.player.alive { return false; }
    let (px, py) = (world.player.x, world.player.y);
    let burned = !world.player.flame_pass
        && world.grid.get(px, py).map_or(false, |c| c.is_burning());
    let caught = world.enemy_at(px, py).is_some() || swapped_with_player(world, before);

    if burned || caught {
        let cause = if burned { "flames" } else { "enemy contact" };
        info!("Player killed by {cause} at ({px}, {py})");
        events.push(GameEvent::PlayerKilled);
        player_die(world);
        return true;
    }
    false
}

fn player_die(world: &mut WorldState) {
    world.player.alive = false;
    world.phase = Phase::Dying;
    world.phase_timer = DYING_SECS;
}

// ══════════════════════════════════════════════════════════════
// Pickups / exit
// ══════════════════════════════════════════════════════════════

fn resolve_pickups(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.alive { return; }
    let (px, py) = (world.player.x, world.player.y);

    let picked = world.grid.get_mut(px, py).and_then(|c| c.power_up.take());
    if let Some(power_up) = picked {
        world.player.apply_power_up(power_up);
        world.score += POWER_UP_POINTS;
        world.set_message(&format!("{power_up:?}!"), 1.0);
        info!("Picked up {power_up:?}");
        events.push(GameEvent::PowerUpCollected { power_up });
    }

    if world.grid.kind_at(px, py) == CellKind::Exit && world.enemies_alive() == 0 {
        world.score += LEVEL_CLEAR_POINTS;
        world.phase = Phase::LevelComplete;
        world.phase_timer = CLEAR_SECS;
        world.set_message(&format!("Stage {} Clear! +{LEVEL_CLEAR_POINTS}", world.current_level + 1), CLEAR_SECS);
        info!("Level {} cleared, score {}", world.current_level + 1, world.score);
        events.push(GameEvent::LevelCleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::ai::EnemyAi;
    use crate::domain::entity::{Enemy, Intelligence};
    use crate::domain::grid::Grid;
    use crate::domain::tile::PowerUp;
    use crate::sim::level::LEVELS;

    /// Playing world on the bare classic arena, no enemies.
    fn arena() -> WorldState {
        let mut world = WorldState::with_ai(GameConfig::default(), EnemyAi::with_seed(5));
        world.grid = Grid::classic();
        world.phase = Phase::Playing;
        world
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn bomb() -> FrameInput {
        FrameInput { movement: None, place_bomb: true }
    }

    fn go(dir: Direction) -> FrameInput {
        FrameInput { movement: Some(dir), place_bomb: false }
    }

    /// Step in small slices until `secs` have passed.
    fn run(world: &mut WorldState, secs: f32) -> Vec<GameEvent> {
        let mut events = vec![];
        let mut t = 0.0;
        while t < secs && world.phase == Phase::Playing {
            events.extend(step(world, idle(), 0.05));
            t += 0.05;
        }
        events
    }

    #[test]
    fn step_ignored_outside_playing() {
        let mut world = arena();
        world.phase = Phase::LevelIntro;
        assert!(step(&mut world, bomb(), 0.1).is_empty());
        assert_eq!(world.tick, 0);
    }

    #[test]
    fn placement_respects_capacity() {
        let mut world = arena();
        let events = step(&mut world, bomb(), 0.01);
        assert_eq!(events, vec![GameEvent::BombPlaced { x: 1, y: 1 }]);

        step(&mut world, go(Direction::Right), 0.01);
        assert!(step(&mut world, bomb(), 0.01).is_empty());
        assert_eq!(world.grid.active_bomb_count(), 1);

        world.player.bomb_capacity = 2;
        step(&mut world, bomb(), 0.01);
        assert_eq!(world.grid.active_bomb_count(), 2);
    }

    #[test]
    fn owner_walks_off_fresh_bomb_but_not_back() {
        let mut world = arena();
        step(&mut world, bomb(), 0.01);
        assert!(step(&mut world, go(Direction::Right), 0.01).is_empty());
        assert_eq!((world.player.x, world.player.y), (2, 1));
        let id = world.grid.bomb_at(1, 1).unwrap();
        assert!(!world.grid.bomb(id).unwrap().player_on_top);

        step(&mut world, go(Direction::Left), 0.5);
        assert_eq!((world.player.x, world.player.y), (2, 1));
    }

    #[test]
    fn fuse_detonates_and_kills_player_in_range() {
        let mut world = arena();
        step(&mut world, bomb(), 0.01);
        let events = run(&mut world, 3.0);
        assert!(events.iter().any(|e| matches!(e, GameEvent::BombDetonated { x: 1, y: 1, .. })));
        assert!(events.contains(&GameEvent::PlayerKilled));
        assert_eq!(world.phase, Phase::Dying);
        assert!(!world.player.alive);
    }

    #[test]
    fn flame_pass_survives_own_blast() {
        let mut world = arena();
        world.player.flame_pass = true;
        step(&mut world, bomb(), 0.01);
        let events = run(&mut world, 3.0);
        assert!(!events.contains(&GameEvent::PlayerKilled));
        assert!(world.player.alive);
    }

    #[test]
    fn blast_destroys_block_and_reveals_power_up() {
        let mut world = arena();
        {
            let cell = world.grid.get_mut(3, 1).unwrap();
            cell.kind = CellKind::Block;
            cell.hidden_power_up = Some(PowerUp::Fire);
        }
        world.player.x = 1;
        world.player.y = 1;
        world.player.bomb_range = 2;
        world.player.flame_pass = true;
        step(&mut world, bomb(), 0.01);
        let events = run(&mut world, 4.0);
        assert!(events.contains(&GameEvent::BlockDestroyed { x: 3, y: 1 }));
        assert!(events.contains(&GameEvent::PowerUpRevealed { x: 3, y: 1, power_up: PowerUp::Fire }));
        assert_eq!(world.grid.kind_at(3, 1), CellKind::Empty);
        assert_eq!(world.grid.get(3, 1).unwrap().power_up, Some(PowerUp::Fire));
    }

    #[test]
    fn chained_bombs_detonate_together() {
        let mut world = arena();
        world.player.bomb_capacity = 2;
        world.player.bomb_range = 2;
        world.player.flame_pass = true;
        step(&mut world, bomb(), 0.01);
        step(&mut world, go(Direction::Right), 0.01);
        step(&mut world, idle(), 0.3);
        step(&mut world, go(Direction::Right), 0.01);
        step(&mut world, bomb(), 0.01);
        assert_eq!(world.grid.active_bomb_count(), 2);

        let mut detonations = 0;
        while world.grid.active_bomb_count() == 2 {
            let events = step(&mut world, idle(), 0.05);
            detonations = events.iter().filter(|e| matches!(e, GameEvent::BombDetonated { .. })).count();
        }
        assert_eq!(detonations, 2);
        assert_eq!(world.grid.active_bomb_count(), 0);
    }

    #[test]
    fn enemy_in_flames_is_destroyed_and_scored() {
        let mut world = arena();
        let mut e = Enemy::new(7, 5, 1, Intelligence::High, false, 0.5, 0.4);
        e.decision_timer = 100.0;
        world.enemies.push(e);
        world.grid.get_mut(5, 1).unwrap().flame_timer = 0.5;
        let events = step(&mut world, idle(), 0.01);
        assert!(events.contains(&GameEvent::EnemyKilled { id: 7, intelligence: Intelligence::High }));
        assert_eq!(world.score, 400);
        assert_eq!(world.enemies_alive(), 0);
    }

    #[test]
    fn enemy_contact_kills_player() {
        let mut world = arena();
        let mut e = Enemy::new(0, 1, 1, Intelligence::Low, false, 0.5, 0.4);
        e.decision_timer = 100.0;
        world.enemies.push(e);
        let events = step(&mut world, idle(), 0.01);
        assert_eq!(events, vec![GameEvent::PlayerKilled]);
        assert_eq!(world.phase, Phase::Dying);
    }

    #[test]
    fn trading_cells_with_enemy_kills_player() {
        let mut world = arena();
        let mut e = Enemy::new(0, 2, 1, Intelligence::Low, false, 0.5, 0.4);
        e.decision_timer = 100.0;
        e.direction = Direction::Left;
        e.move_timer = 0.4;
        world.enemies.push(e);

        let events = step(&mut world, go(Direction::Right), 0.01);
        assert_eq!((world.player.x, world.player.y), (2, 1));
        assert_eq!(world.enemies[0].pos(), (1, 1));
        assert_eq!(events, vec![GameEvent::PlayerKilled]);
        assert_eq!(world.phase, Phase::Dying);
    }

    #[test]
    fn enemy_moving_alongside_is_no_contact() {
        let mut world = arena();
        let mut e = Enemy::new(0, 3, 1, Intelligence::Low, false, 0.5, 0.4);
        e.decision_timer = 100.0;
        e.direction = Direction::Right;
        e.move_timer = 0.4;
        world.enemies.push(e);

        let events = step(&mut world, go(Direction::Right), 0.01);
        assert_eq!(world.enemies[0].pos(), (4, 1));
        assert!(events.is_empty());
        assert!(world.player.alive);
    }

    #[test]
    fn power_up_pickup_applies_and_scores() {
        let mut world = arena();
        world.grid.get_mut(2, 1).unwrap().power_up = Some(PowerUp::ExtraBomb);
        let events = step(&mut world, go(Direction::Right), 0.01);
        assert!(events.contains(&GameEvent::PowerUpCollected { power_up: PowerUp::ExtraBomb }));
        assert_eq!(world.player.bomb_capacity, 2);
        assert_eq!(world.score, POWER_UP_POINTS);
        assert_eq!(world.grid.get(2, 1).unwrap().power_up, None);
    }

    #[test]
    fn exit_needs_all_enemies_gone() {
        let mut world = arena();
        world.grid.get_mut(2, 1).unwrap().kind = CellKind::Exit;
        let mut e = Enemy::new(0, 9, 7, Intelligence::Low, false, 0.5, 0.4);
        e.decision_timer = 100.0;
        world.enemies.push(e);

        step(&mut world, go(Direction::Right), 0.01);
        assert_eq!(world.phase, Phase::Playing);

        world.enemies[0].alive = false;
        let events = step(&mut world, idle(), 0.01);
        assert_eq!(events, vec![GameEvent::LevelCleared]);
        assert_eq!(world.phase, Phase::LevelComplete);
        assert_eq!(world.score, LEVEL_CLEAR_POINTS);
    }

    // ── Phase timers ──

    #[test]
    fn intro_gives_way_to_playing() {
        let mut world = arena();
        load_level(&mut world, 0);
        assert_eq!(world.phase, Phase::LevelIntro);
        tick_phase(&mut world, 1.0);
        assert_eq!(world.phase, Phase::LevelIntro);
        tick_phase(&mut world, 1.5);
        assert_eq!(world.phase, Phase::Playing);
    }

    #[test]
    fn dying_costs_a_life_then_restarts() {
        let mut world = arena();
        load_level(&mut world, 0);
        world.phase = Phase::Playing;
        world.lives = 2;
        player_die(&mut world);
        tick_phase(&mut world, DYING_SECS + 0.1);
        assert_eq!(world.lives, 1);
        assert_eq!(world.phase, Phase::LevelIntro);
        assert!(world.player.alive);
    }

    #[test]
    fn last_life_ends_game() {
        let mut world = arena();
        world.lives = 1;
        player_die(&mut world);
        tick_phase(&mut world, DYING_SECS + 0.1);
        assert_eq!(world.phase, Phase::GameOver);
    }

    #[test]
    fn level_complete_loads_next() {
        let mut world = arena();
        load_level(&mut world, 0);
        world.phase = Phase::LevelComplete;
        world.phase_timer = CLEAR_SECS;
        tick_phase(&mut world, CLEAR_SECS + 0.1);
        assert_eq!(world.current_level, 1);
        assert_eq!(world.phase, Phase::LevelIntro);
    }

    #[test]
    fn clearing_final_level_completes_game() {
        let mut world = arena();
        load_level(&mut world, LEVELS.len() - 1);
        world.phase = Phase::LevelComplete;
        world.phase_timer = 0.1;
        tick_phase(&mut world, 0.2);
        assert_eq!(world.phase, Phase::GameComplete);
    }
}
