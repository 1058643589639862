/// Motion integrator: turns a chosen direction into whole-cell steps.
///
/// Actors move one cell per `step_interval` seconds. The AI only picks a
/// direction; whether the step lands is decided here against the grid.
///
/// ## Stuck tracking (enemies)
///   - step lands              → `stuck_timer = 0`
///   - step blocked, dir set   → `stuck_timer += step_interval`
///   - dir = None              → no change (standing still is not stuck)

use super::entity::{Direction, Enemy, Player};
use super::grid::Grid;

impl Enemy {
    /// Advance the enemy along `self.direction` by `dt` seconds.
    pub fn advance(&mut self, dt: f32, grid: &Grid) {
        if !self.alive { return; }
        self.move_timer += dt;
        if self.move_timer < self.step_interval { return; }
        self.move_timer -= self.step_interval;

        if self.direction == Direction::None { return; }
        let (dx, dy) = self.direction.delta();
        match grid.try_get_cell(self.x as i32 + dx, self.y as i32 + dy) {
            Some(cell) if cell.is_walkable(self.can_pass_walls, false) => {
                (self.x, self.y) = cell.pos();
                self.stuck_timer = 0.0;
            }
            _ => self.stuck_timer += self.step_interval,
        }
    }
}

impl Player {
    /// Try one step in `movement`. Returns true if the player changed cell.
    /// The cooldown keeps ticking even when no key is held.
    pub fn advance(&mut self, movement: Option<Direction>, dt: f32, grid: &Grid) -> bool {
        if !self.alive { return false; }
        if self.move_cooldown > 0.0 {
            self.move_cooldown = (self.move_cooldown - dt).max(0.0);
        }
        let dir = match movement {
            Some(d) if d != Direction::None => d,
            _ => return false,
        };
        if self.move_cooldown > 0.0 { return false; }

        let (dx, dy) = dir.delta();
        let Some((nx, ny)) = grid.try_get_cell(self.x as i32 + dx, self.y as i32 + dy).map(|c| c.pos())
        else { return false };
        if !grid.is_walkable_for_player(nx, ny, self) { return false; }

        self.x = nx;
        self.y = ny;
        self.move_cooldown = self.step_interval;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Intelligence;

    fn enemy_at(x: usize, y: usize, dir: Direction) -> Enemy {
        let mut e = Enemy::new(0, x, y, Intelligence::Low, false, 0.5, 0.25);
        e.direction = dir;
        e
    }

    #[test]
    fn enemy_steps_once_per_interval() {
        let grid = Grid::from_rows(&["     "]);
        let mut e = enemy_at(0, 0, Direction::Right);
        e.advance(0.1, &grid);
        assert_eq!(e.pos(), (0, 0));
        e.advance(0.2, &grid);
        assert_eq!(e.pos(), (1, 0));
        e.advance(0.25, &grid);
        assert_eq!(e.pos(), (2, 0));
    }

    #[test]
    fn blocked_enemy_accumulates_stuck_time() {
        let grid = Grid::from_rows(&[" #"]);
        let mut e = enemy_at(0, 0, Direction::Right);
        for _ in 0..4 { e.advance(0.25, &grid); }
        assert_eq!(e.pos(), (0, 0));
        assert!((e.stuck_timer - 1.0).abs() < 1e-4);
    }

    #[test]
    fn edge_of_grid_counts_as_blocked() {
        let grid = Grid::from_rows(&["  "]);
        let mut e = enemy_at(0, 0, Direction::Left);
        e.advance(0.25, &grid);
        assert!(e.stuck_timer > 0.0);
    }

    #[test]
    fn idle_enemy_is_not_stuck() {
        let grid = Grid::from_rows(&["  "]);
        let mut e = enemy_at(0, 0, Direction::None);
        for _ in 0..10 { e.advance(0.25, &grid); }
        assert_eq!(e.stuck_timer, 0.0);
    }

    #[test]
    fn successful_step_clears_stuck_time() {
        let grid = Grid::from_rows(&["  "]);
        let mut e = enemy_at(0, 0, Direction::Right);
        e.stuck_timer = 0.8;
        e.advance(0.25, &grid);
        assert_eq!(e.pos(), (1, 0));
        assert_eq!(e.stuck_timer, 0.0);
    }

    #[test]
    fn enemies_do_not_cross_bombs() {
        let mut grid = Grid::from_rows(&["   "]);
        grid.place_bomb(1, 0, 1, 2.0).unwrap();
        let mut e = enemy_at(0, 0, Direction::Right);
        e.advance(0.25, &grid);
        assert_eq!(e.pos(), (0, 0));
    }

    #[test]
    fn wall_pass_enemy_crosses_blocks() {
        let grid = Grid::from_rows(&[" + "]);
        let mut e = enemy_at(0, 0, Direction::Right);
        e.can_pass_walls = true;
        e.advance(0.25, &grid);
        assert_eq!(e.pos(), (1, 0));
    }

    #[test]
    fn player_cooldown_gates_steps() {
        let grid = Grid::from_rows(&["    "]);
        let mut p = Player::new(0, 0);
        p.step_interval = 0.2;
        assert!(p.advance(Some(Direction::Right), 0.05, &grid));
        assert!(!p.advance(Some(Direction::Right), 0.1, &grid));
        assert!(p.advance(Some(Direction::Right), 0.15, &grid));
        assert_eq!((p.x, p.y), (2, 0));
    }

    #[test]
    fn player_blocked_by_block_without_wall_pass() {
        let grid = Grid::from_rows(&[" + "]);
        let mut p = Player::new(0, 0);
        assert!(!p.advance(Some(Direction::Right), 0.1, &grid));
        p.wall_pass = true;
        assert!(p.advance(Some(Direction::Right), 0.1, &grid));
    }

    #[test]
    fn player_none_does_not_move() {
        let grid = Grid::from_rows(&["  "]);
        let mut p = Player::new(0, 0);
        assert!(!p.advance(None, 0.1, &grid));
        assert!(!p.advance(Some(Direction::None), 0.1, &grid));
    }
}
