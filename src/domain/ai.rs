/// Enemy AI: per-tick direction choice from grid, danger zone and pathfinder.
///
/// Decision order (once per enemy, when its decision timer expires):
///   1. **Evade** when standing in the danger zone: step to a safe neighbour,
///      else head for the nearest safe cell, else any walkable neighbour.
///   2. **Tier behaviour**
///      - Low:    persistence-biased random walk.
///      - Normal: within 5 cells, 30% chance to pursue along a cached path;
///                otherwise random walk.
///      - High:   Chasing/Wandering with hysteresis (enter at 8, leave above
///                8 × 1.3); never steps into danger; wanders on safe cells.
///   3. **Stuck override**: `stuck_timer > 1s` forces a random valid
///      direction regardless of what the tier chose. Evasion is exempt.
///
/// Between decisions the enemy keeps its last direction. Nothing here
/// fails loudly: no move found means `Direction::None` (stand still).

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::entity::{AiState, Direction, Enemy, Intelligence, Player};
use super::explosion::DangerZone;
use super::grid::{Cell, Grid};
use super::pathfinding::{self, manhattan, Traversal};

const JITTER_MIN: f32 = 0.8;
const JITTER_MAX: f32 = 1.2;

/// Chance that a staying-valid direction is kept when reconsidering.
const PERSISTENCE: f64 = 0.7;
const LOW_RECONSIDER: f64 = 0.1;

const NORMAL_RADIUS: u32 = 5;
const NORMAL_PURSUIT: f64 = 0.3;
const NORMAL_RECONSIDER: f64 = 0.2;

const HIGH_RADIUS: u32 = 8;
const HIGH_LEAVE_FACTOR: f32 = 1.3;
const HIGH_RECONSIDER: f64 = 0.15;

/// Seconds without progress before the stuck override kicks in.
pub const STUCK_LIMIT: f32 = 1.0;

/// High-tier hysteresis: enter Chasing at `HIGH_RADIUS`, leave only beyond
/// `HIGH_RADIUS × HIGH_LEAVE_FACTOR`.
pub fn next_ai_state(state: AiState, distance: u32) -> AiState {
    let chasing = match state {
        AiState::Chasing => distance as f32 <= HIGH_RADIUS as f32 * HIGH_LEAVE_FACTOR,
        AiState::Wandering => distance <= HIGH_RADIUS,
    };
    if chasing { AiState::Chasing } else { AiState::Wandering }
}

/// How a decision was reached.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Decision {
    Evade,
    Pursue,
    /// Wandering; current direction kept without reconsidering.
    Keep,
    /// Reconsidered, but persistence kept the current direction.
    Persist,
    /// Fresh uniform pick from the valid directions (may repeat the old one).
    Reroll,
    /// Nothing walkable.
    Stand,
}

/// Outcome of trying to continue a cached path.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PathStep {
    Step(Direction),
    /// No waypoints left; target cleared.
    Exhausted,
    /// Next waypoint unsafe or unreachable; whole cache dropped.
    Invalidated,
}

pub struct EnemyAi {
    rng: StdRng,
}

impl EnemyAi {
    pub fn new() -> Self {
        EnemyAi { rng: StdRng::from_os_rng() }
    }

    pub fn with_seed(seed: u64) -> Self {
        EnemyAi { rng: StdRng::seed_from_u64(seed) }
    }

    /// Update every enemy for one tick against a single danger snapshot.
    /// Returns the snapshot so callers can reuse it.
    pub fn tick(&mut self, enemies: &mut [Enemy], player: &Player, grid: &Grid, dt: f32) -> DangerZone {
        let danger = DangerZone::compute(grid);
        for enemy in enemies.iter_mut() {
            self.update(enemy, player, grid, &danger, dt);
        }
        danger
    }

    /// Per-enemy entry point: decide when the timer elapses, then move.
    pub fn update(&mut self, enemy: &mut Enemy, player: &Player, grid: &Grid, danger: &DangerZone, dt: f32) {
        if !enemy.alive { return; }

        enemy.decision_timer -= dt;
        if enemy.decision_timer <= 0.0 {
            enemy.decision_timer =
                enemy.decision_interval * self.rng.random_range(JITTER_MIN..=JITTER_MAX);
            let decision = self.decide(enemy, player, grid, danger);

            // An escape route out of the blast wins over the stuck override.
            if decision != Decision::Evade && enemy.stuck_timer > STUCK_LIMIT {
                enemy.direction = self.random_new_direction(enemy, grid);
                enemy.stuck_timer = 0.0;
            }
        }

        enemy.advance(dt, grid);
    }

    /// Choose the enemy's next direction right now.
    pub fn decide(&mut self, enemy: &mut Enemy, player: &Player, grid: &Grid, danger: &DangerZone) -> Decision {
        if danger.contains(enemy.x, enemy.y) {
            if let Some(dir) = evade(enemy, grid, danger) {
                enemy.direction = dir;
                return Decision::Evade;
            }
        }

        match enemy.intelligence {
            Intelligence::Low => self.wander(enemy, grid, LOW_RECONSIDER),
            Intelligence::Normal => self.decide_normal(enemy, player, grid, danger),
            Intelligence::High => self.decide_high(enemy, player, grid, danger),
        }
    }

    // ── Tiers ──

    fn decide_normal(&mut self, enemy: &mut Enemy, player: &Player, grid: &Grid, danger: &DangerZone) -> Decision {
        let distance = manhattan(enemy.pos(), (player.x, player.y));
        if distance <= NORMAL_RADIUS && self.rng.random_bool(NORMAL_PURSUIT) {
            let traversal = Traversal::new(enemy.can_pass_walls).avoiding_bombs();
            if let Some(dir) = pursue(enemy, player, grid, danger, &traversal) {
                enemy.direction = dir;
                return Decision::Pursue;
            }
        }
        self.wander(enemy, grid, NORMAL_RECONSIDER)
    }

    fn decide_high(&mut self, enemy: &mut Enemy, player: &Player, grid: &Grid, danger: &DangerZone) -> Decision {
        let distance = manhattan(enemy.pos(), (player.x, player.y));
        enemy.ai_state = next_ai_state(enemy.ai_state, distance);

        if enemy.ai_state == AiState::Chasing {
            let traversal = Traversal::new(enemy.can_pass_walls).avoiding_bombs().avoiding(danger);
            if let Some(dir) = pursue(enemy, player, grid, danger, &traversal) {
                enemy.direction = dir;
                return Decision::Pursue;
            }
        }
        self.safe_wander(enemy, grid, danger, HIGH_RECONSIDER)
    }

    // ── Wandering ──

    /// Random walk that prefers to keep going the same way.
    fn wander(&mut self, enemy: &mut Enemy, grid: &Grid, reconsider: f64) -> Decision {
        let valid = valid_directions(enemy, grid);
        self.pick_from(enemy, &valid, reconsider, true)
    }

    /// Random walk restricted to steps that leave the danger zone,
    /// or to any valid step when none does.
    fn safe_wander(&mut self, enemy: &mut Enemy, grid: &Grid, danger: &DangerZone, reconsider: f64) -> Decision {
        let valid = valid_directions(enemy, grid);
        let safe: Vec<Direction> = valid.iter().copied()
            .filter(|d| d.offset(enemy.x, enemy.y).map_or(false, |(x, y)| !danger.contains(x, y)))
            .collect();
        let pool = if safe.is_empty() { valid } else { safe };
        self.pick_from(enemy, &pool, reconsider, false)
    }

    fn pick_from(&mut self, enemy: &mut Enemy, pool: &[Direction], reconsider: f64, persistent: bool) -> Decision {
        if pool.is_empty() {
            enemy.direction = Direction::None;
            return Decision::Stand;
        }
        let current_ok = pool.contains(&enemy.direction);
        if current_ok && !self.rng.random_bool(reconsider) { return Decision::Keep; }
        if current_ok && persistent && self.rng.random_bool(PERSISTENCE) { return Decision::Persist; }
        if let Some(&dir) = pool.choose(&mut self.rng) {
            enemy.direction = dir;
        }
        Decision::Reroll
    }

    /// Stuck override: any valid direction, a different one if possible.
    fn random_new_direction(&mut self, enemy: &Enemy, grid: &Grid) -> Direction {
        let valid = valid_directions(enemy, grid);
        let fresh: Vec<Direction> = valid.iter().copied().filter(|&d| d != enemy.direction).collect();
        let pool = if fresh.is_empty() { &valid } else { &fresh };
        pool.choose(&mut self.rng).copied().unwrap_or(Direction::None)
    }
}

impl Default for EnemyAi {
    fn default() -> Self {
        Self::new()
    }
}

// ══════════════════════════════════════════════════════════════
// Stateless helpers
// ══════════════════════════════════════════════════════════════

/// Walkable neighbours in scan order (Up, Down, Left, Right).
fn open_neighbors<'g>(enemy: &Enemy, grid: &'g Grid) -> impl Iterator<Item = &'g Cell> + 'g {
    let can_pass_walls = enemy.can_pass_walls;
    grid.neighbors(enemy.x, enemy.y)
        .filter(move |c| c.is_walkable(can_pass_walls, false))
}

/// Cardinal directions the enemy could step into right now.
fn valid_directions(enemy: &Enemy, grid: &Grid) -> Vec<Direction> {
    open_neighbors(enemy, grid)
        .map(|c| Direction::toward(enemy.pos(), c.pos()))
        .collect()
}

/// Escape from the danger zone. First safe neighbour wins; then the first
/// step toward the nearest safe cell; then any walkable neighbour.
fn evade(enemy: &Enemy, grid: &Grid, danger: &DangerZone) -> Option<Direction> {
    let mut fallback = None;
    for cell in open_neighbors(enemy, grid) {
        let dir = Direction::toward(enemy.pos(), cell.pos());
        if !danger.contains(cell.x(), cell.y()) { return Some(dir); }
        if fallback.is_none() { fallback = Some(dir); }
    }

    if let Some(safe) = pathfinding::find_safe_cell(grid, enemy.pos(), danger, enemy.can_pass_walls) {
        let traversal = Traversal::new(enemy.can_pass_walls).avoiding_bombs();
        let first = pathfinding::find_path(grid, enemy.pos(), safe, &traversal)
            .first()
            .copied()
            .unwrap_or(safe);
        let dir = Direction::toward(enemy.pos(), first);
        if dir != Direction::None { return Some(dir); }
    }

    fallback
}

/// Continue the cached path, or plan a fresh one when none is left.
/// An invalidated cache is not replanned until the next decision.
fn pursue(
    enemy: &mut Enemy,
    player: &Player,
    grid: &Grid,
    danger: &DangerZone,
    traversal: &Traversal,
) -> Option<Direction> {
    match follow_path(enemy, grid, danger) {
        PathStep::Step(dir) => return Some(dir),
        PathStep::Invalidated => return None,
        PathStep::Exhausted => {}
    }

    let goal = (player.x, player.y);
    let path = pathfinding::find_path(grid, enemy.pos(), goal, traversal);
    if path.is_empty() { return None; }
    enemy.path = path.into();
    enemy.target = Some(goal);

    match follow_path(enemy, grid, danger) {
        PathStep::Step(dir) => Some(dir),
        _ => None,
    }
}

/// Consume reached waypoints and validate the next one.
fn follow_path(enemy: &mut Enemy, grid: &Grid, danger: &DangerZone) -> PathStep {
    while enemy.path.front() == Some(&enemy.pos()) {
        enemy.path.pop_front();
    }
    let Some(&next) = enemy.path.front() else {
        enemy.target = None;
        return PathStep::Exhausted;
    };

    let adjacent = manhattan(enemy.pos(), next) == 1;
    let walkable = grid.is_walkable(next.0, next.1, enemy.can_pass_walls, false);
    if danger.contains(next.0, next.1) || !adjacent || !walkable {
        enemy.clear_path();
        return PathStep::Invalidated;
    }
    PathStep::Step(Direction::toward(enemy.pos(), next))
}
