/// Entities: Player, Enemy, Bomb.
/// The grid owns bombs by slot; actors are owned by the world.

use std::collections::VecDeque;

use super::tile::PowerUp;

/// Single-step movement direction. `None` = stand still this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Cardinal directions in scan priority order.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    /// Neighbouring coordinate in this direction, or None below zero.
    /// Upper bounds are the grid's concern.
    pub fn offset(self, x: usize, y: usize) -> Option<(usize, usize)> {
        let (dx, dy) = self.delta();
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if nx < 0 || ny < 0 { return None; }
        Some((nx as usize, ny as usize))
    }

    /// Resolve the step from `from` toward `to`.
    /// Any horizontal delta wins; vertical only when the columns match;
    /// `None` when already there.
    pub fn toward(from: (usize, usize), to: (usize, usize)) -> Direction {
        use std::cmp::Ordering::*;
        match (to.0.cmp(&from.0), to.1.cmp(&from.1)) {
            (Greater, _) => Direction::Right,
            (Less, _) => Direction::Left,
            (Equal, Greater) => Direction::Down,
            (Equal, Less) => Direction::Up,
            (Equal, Equal) => Direction::None,
        }
    }
}

/// Frame input: movement is continuous (held key), bomb is edge-triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<Direction>,
    pub place_bomb: bool,
}

// ── Bomb ──

/// Slot index into the grid's bomb arena.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct BombId(pub usize);

#[derive(Clone, Debug)]
pub struct Bomb {
    pub x: usize,
    pub y: usize,
    pub range: u32,
    pub fuse: f32,          // seconds until detonation
    pub is_active: bool,
    pub player_on_top: bool, // owner hasn't stepped off yet
}

impl Bomb {
    pub fn new(x: usize, y: usize, range: u32, fuse: f32) -> Self {
        Bomb { x, y, range, fuse, is_active: true, player_on_top: true }
    }

    /// Advance the fuse. Returns true once the bomb should detonate.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.is_active { return false; }
        self.fuse -= dt;
        self.fuse <= 0.0
    }
}

// ── Player ──

const MIN_STEP_INTERVAL: f32 = 0.08;
const SPEED_FACTOR: f32 = 0.8;
const MAX_RANGE: u32 = 8;
const MAX_CAPACITY: u32 = 8;

#[derive(Clone, Debug)]
pub struct Player {
    pub x: usize,
    pub y: usize,
    pub alive: bool,
    pub bomb_capacity: u32,
    pub bomb_range: u32,
    pub step_interval: f32,
    pub move_cooldown: f32,
    pub wall_pass: bool,
    pub bomb_pass: bool,
    pub flame_pass: bool,
}

impl Player {
    pub fn new(x: usize, y: usize) -> Self {
        Player {
            x, y,
            alive: true,
            bomb_capacity: 1,
            bomb_range: 1,
            step_interval: 0.2,
            move_cooldown: 0.0,
            wall_pass: false,
            bomb_pass: false,
            flame_pass: false,
        }
    }

    pub fn apply_power_up(&mut self, power_up: PowerUp) {
        match power_up {
            PowerUp::ExtraBomb => self.bomb_capacity = (self.bomb_capacity + 1).min(MAX_CAPACITY),
            PowerUp::Fire => self.bomb_range = (self.bomb_range + 1).min(MAX_RANGE),
            PowerUp::Speed => {
                self.step_interval = (self.step_interval * SPEED_FACTOR).max(MIN_STEP_INTERVAL);
            }
            PowerUp::WallPass => self.wall_pass = true,
            PowerUp::BombPass => self.bomb_pass = true,
            PowerUp::FlamePass => self.flame_pass = true,
        }
    }
}

// ── Enemy ──

/// Behaviour tier. Drives the AI dispatch.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Intelligence {
    Low,
    Normal,
    High,
}

impl Intelligence {
    /// Score awarded for destroying an enemy of this tier.
    pub fn points(self) -> u32 {
        match self {
            Intelligence::Low => 100,
            Intelligence::Normal => 200,
            Intelligence::High => 400,
        }
    }
}

/// Pursuit state. Only the High tier transitions out of `Wandering`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AiState {
    Wandering,
    Chasing,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: usize,
    pub x: usize,
    pub y: usize,
    pub spawn_x: usize,
    pub spawn_y: usize,
    pub intelligence: Intelligence,
    pub can_pass_walls: bool,
    pub alive: bool,
    pub direction: Direction,
    pub ai_state: AiState,
    pub decision_timer: f32,
    pub decision_interval: f32,
    pub path: VecDeque<(usize, usize)>,
    pub target: Option<(usize, usize)>,
    pub stuck_timer: f32,   // seconds without net progress (motion integrator)
    pub step_interval: f32, // seconds per cell
    pub move_timer: f32,
}

impl Enemy {
    pub fn new(
        id: usize,
        x: usize, y: usize,
        intelligence: Intelligence,
        can_pass_walls: bool,
        decision_interval: f32,
        step_interval: f32,
    ) -> Self {
        Enemy {
            id, x, y,
            spawn_x: x,
            spawn_y: y,
            intelligence,
            can_pass_walls,
            alive: true,
            direction: Direction::None,
            ai_state: AiState::Wandering,
            decision_timer: 0.0,
            decision_interval,
            path: VecDeque::new(),
            target: None,
            stuck_timer: 0.0,
            step_interval,
            move_timer: 0.0,
        }
    }

    pub fn pos(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    /// Drop the cached path and its target.
    pub fn clear_path(&mut self) {
        self.path.clear();
        self.target = None;
    }

    /// Put the enemy back on its spawn cell with fresh AI state.
    pub fn respawn(&mut self) {
        self.x = self.spawn_x;
        self.y = self.spawn_y;
        self.direction = Direction::None;
        self.ai_state = AiState::Wandering;
        self.decision_timer = 0.0;
        self.stuck_timer = 0.0;
        self.move_timer = 0.0;
        self.clear_path();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toward_prefers_horizontal_on_tie() {
        assert_eq!(Direction::toward((2, 2), (4, 4)), Direction::Right);
        assert_eq!(Direction::toward((2, 2), (0, 0)), Direction::Left);
    }

    #[test]
    fn toward_distant_target_goes_horizontal_first() {
        assert_eq!(Direction::toward((2, 2), (3, 5)), Direction::Right);
        assert_eq!(Direction::toward((4, 6), (3, 0)), Direction::Left);
    }

    #[test]
    fn toward_vertical_when_no_horizontal_delta() {
        assert_eq!(Direction::toward((2, 2), (2, 5)), Direction::Down);
        assert_eq!(Direction::toward((2, 2), (2, 0)), Direction::Up);
    }

    #[test]
    fn toward_self_is_none() {
        assert_eq!(Direction::toward((3, 3), (3, 3)), Direction::None);
    }

    #[test]
    fn offset_below_zero_is_none() {
        assert_eq!(Direction::Left.offset(0, 3), None);
        assert_eq!(Direction::Up.offset(3, 0), None);
        assert_eq!(Direction::Right.offset(0, 3), Some((1, 3)));
        assert_eq!(Direction::None.offset(2, 2), Some((2, 2)));
    }

    #[test]
    fn bomb_fuse_expires() {
        let mut b = Bomb::new(1, 1, 2, 0.5);
        assert!(!b.tick(0.2));
        assert!(!b.tick(0.2));
        assert!(b.tick(0.2));
    }

    #[test]
    fn inactive_bomb_never_expires() {
        let mut b = Bomb::new(1, 1, 2, 0.1);
        b.is_active = false;
        assert!(!b.tick(1.0));
    }

    #[test]
    fn power_ups_apply_and_cap() {
        let mut p = Player::new(1, 1);
        p.apply_power_up(PowerUp::ExtraBomb);
        p.apply_power_up(PowerUp::Fire);
        assert_eq!(p.bomb_capacity, 2);
        assert_eq!(p.bomb_range, 2);

        for _ in 0..20 { p.apply_power_up(PowerUp::Fire); }
        assert_eq!(p.bomb_range, MAX_RANGE);

        for _ in 0..50 { p.apply_power_up(PowerUp::Speed); }
        assert!((p.step_interval - MIN_STEP_INTERVAL).abs() < 1e-6);

        p.apply_power_up(PowerUp::FlamePass);
        assert!(p.flame_pass);
    }

    #[test]
    fn enemy_respawn_resets_ai_state() {
        let mut e = Enemy::new(0, 5, 5, Intelligence::High, false, 0.5, 0.4);
        e.x = 3;
        e.ai_state = AiState::Chasing;
        e.path.push_back((3, 4));
        e.target = Some((1, 1));
        e.respawn();
        assert_eq!(e.pos(), (5, 5));
        assert_eq!(e.ai_state, AiState::Wandering);
        assert!(e.path.is_empty());
        assert_eq!(e.target, None);
    }
}
