/// The arena: a fixed-size tile map that owns every Cell and every Bomb.
///
/// ## Ownership
///
/// Cells live in a flat `Vec<Cell>` indexed `y * width + x` and are recycled
/// between levels, never reallocated. Bombs live in a slot arena
/// (`Vec<Option<Bomb>>`); a Cell refers to its bomb by `BombId` and a Bomb
/// refers back to its Cell by coordinates. No pointers cross the boundary.
///
/// ## Bounds
///
/// Out-of-range queries return `None` (or "not walkable"). Callers treat
/// "no cell" exactly like an impassable cell.
///
/// ## Transitions
///
/// A Block caught in a blast keeps `kind == Block` while `destroy_timer`
/// runs, so it still blocks movement and blasts until it is gone. A cell
/// with `flame_timer > 0` is burning: passable, but lethal.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::entity::{Bomb, BombId, Direction, Player};
use super::tile::{CellKind, PowerUp};

pub const DEFAULT_WIDTH: usize = 11;
pub const DEFAULT_HEIGHT: usize = 9;
pub const DEFAULT_TILE_SIZE: f32 = 16.0;

/// Player start cell.
pub const PLAYER_SPAWN: (usize, usize) = (1, 1);

/// L-shaped area around the spawn that never receives a Block,
/// so the first bomb always has somewhere to hide from.
const SPAWN_PROTECTED: [(usize, usize); 3] = [(1, 1), (2, 1), (1, 2)];

// ══════════════════════════════════════════════════════════════
// Cell
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Cell {
    x: usize,
    y: usize,
    pub kind: CellKind,
    pub bomb: Option<BombId>,
    pub power_up: Option<PowerUp>,
    pub has_hidden_exit: bool,
    pub hidden_power_up: Option<PowerUp>,
    pub destroy_timer: f32, // >0: Block is crumbling
    pub flame_timer: f32,   // >0: explosion burning here
}

impl Cell {
    fn new(x: usize, y: usize) -> Self {
        Cell {
            x, y,
            kind: CellKind::Empty,
            bomb: None,
            power_up: None,
            has_hidden_exit: false,
            hidden_power_up: None,
            destroy_timer: 0.0,
            flame_timer: 0.0,
        }
    }

    pub fn x(&self) -> usize { self.x }
    pub fn y(&self) -> usize { self.y }
    pub fn pos(&self) -> (usize, usize) { (self.x, self.y) }

    /// Can an actor with these capabilities enter this cell?
    pub fn is_walkable(&self, can_pass_walls: bool, can_pass_bombs: bool) -> bool {
        match self.kind {
            CellKind::Wall => false,
            CellKind::Block if !can_pass_walls => false,
            _ => self.bomb.is_none() || can_pass_bombs,
        }
    }

    /// Can a blast travel through this cell?
    ///
    /// Flame-pass is an actor survival trait and does not let blasts
    /// cross Blocks, so the flag is accepted but not consulted.
    pub fn can_explosion_pass(&self, _has_flame_pass: bool) -> bool {
        !self.kind.stops_blast()
    }

    pub fn is_burning(&self) -> bool {
        self.flame_timer > 0.0
    }

    pub fn is_crumbling(&self) -> bool {
        self.kind == CellKind::Block && self.destroy_timer > 0.0
    }

    /// Back to a blank floor cell (level reset).
    fn recycle(&mut self) {
        let (x, y) = (self.x, self.y);
        *self = Cell::new(x, y);
    }
}

/// What a destroyed Block left behind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Reveal {
    pub x: usize,
    pub y: usize,
    pub exit: bool,
    pub power_up: Option<PowerUp>,
}

// ══════════════════════════════════════════════════════════════
// Grid
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    tile_size: f32,
    cells: Vec<Cell>,
    bombs: Vec<Option<Bomb>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(x, y));
            }
        }
        Grid { width, height, tile_size: DEFAULT_TILE_SIZE, cells, bombs: Vec::new() }
    }

    pub fn with_tile_size(mut self, tile_size: f32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 { return None; }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height { return None; }
        Some(y * self.width + x)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Bounds-checked lookup with signed coordinates.
    #[inline]
    pub fn try_get_cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    #[inline]
    pub fn try_get_cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        let i = self.index(x, y)?;
        Some(&mut self.cells[i])
    }

    /// Unsigned convenience over `try_get_cell`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        let (x, y) = signed(x, y)?;
        self.try_get_cell(x, y)
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        let (x, y) = signed(x, y)?;
        self.try_get_cell_mut(x, y)
    }

    /// Kind at (x, y); out of bounds reads as Wall.
    pub fn kind_at(&self, x: usize, y: usize) -> CellKind {
        self.get(x, y).map_or(CellKind::Wall, |c| c.kind)
    }

    /// Walkability at (x, y). Out of bounds is never walkable.
    pub fn is_walkable(&self, x: usize, y: usize, can_pass_walls: bool, can_pass_bombs: bool) -> bool {
        self.get(x, y).map_or(false, |c| c.is_walkable(can_pass_walls, can_pass_bombs))
    }

    /// Player walkability: capability flags plus the owner's grace on a
    /// bomb it is still standing on.
    pub fn is_walkable_for_player(&self, x: usize, y: usize, player: &Player) -> bool {
        let Some(cell) = self.get(x, y) else { return false };
        if cell.is_walkable(player.wall_pass, player.bomb_pass) { return true; }
        let on_own_bomb = cell.bomb
            .and_then(|id| self.bomb(id))
            .map_or(false, |b| b.player_on_top && (b.x, b.y) == (player.x, player.y));
        on_own_bomb && cell.is_walkable(player.wall_pass, true)
    }

    /// The four orthogonally adjacent in-bounds cells (Up, Down, Left, Right).
    pub fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = &Cell> + '_ {
        let origin = signed(x, y);
        Direction::CARDINALS.into_iter().filter_map(move |d| {
            let (ox, oy) = origin?;
            let (dx, dy) = d.delta();
            self.try_get_cell(ox + dx, oy + dy)
        })
    }

    // ── Coordinate mapping ──

    /// Pixel position → containing cell. None outside the arena.
    pub fn pixel_to_grid(&self, px: f32, py: f32) -> Option<(usize, usize)> {
        if px < 0.0 || py < 0.0 { return None; }
        let x = (px / self.tile_size).floor() as i32;
        let y = (py / self.tile_size).floor() as i32;
        self.in_bounds(x, y).then(|| (x as usize, y as usize))
    }

    /// Cell → pixel position of its centre.
    pub fn grid_to_pixel(&self, x: usize, y: usize) -> (f32, f32) {
        (
            (x as f32 + 0.5) * self.tile_size,
            (y as f32 + 0.5) * self.tile_size,
        )
    }

    // ── Read-only iteration ──

    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    pub fn cells_of_type(&self, kind: CellKind) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(move |c| c.kind == kind)
    }

    pub fn count_cells(&self, kind: CellKind) -> usize {
        self.cells_of_type(kind).count()
    }
}

fn signed(x: usize, y: usize) -> Option<(i32, i32)> {
    Some((i32::try_from(x).ok()?, i32::try_from(y).ok()?))
}

// ══════════════════════════════════════════════════════════════
// Level authoring
// ══════════════════════════════════════════════════════════════

impl Grid {
    /// Blank every cell and drop every bomb. Cells are reused in place.
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.recycle();
        }
        self.bombs.clear();
    }

    /// Remove bombs, flames and pending destruction but keep the layout.
    pub fn clear_dynamic_elements(&mut self) {
        for cell in &mut self.cells {
            cell.bomb = None;
            cell.flame_timer = 0.0;
            cell.destroy_timer = 0.0;
        }
        self.bombs.clear();
    }

    pub fn is_spawn_protected(x: usize, y: usize) -> bool {
        SPAWN_PROTECTED.contains(&(x, y))
    }

    /// Border walls plus an interior pillar on every even (x, y).
    pub fn setup_classic_pattern(&mut self) {
        let (w, h) = (self.width, self.height);
        for cell in &mut self.cells {
            let border = cell.x == 0 || cell.y == 0 || cell.x + 1 == w || cell.y + 1 == h;
            let pillar = cell.x % 2 == 0 && cell.y % 2 == 0;
            cell.kind = if border || pillar { CellKind::Wall } else { CellKind::Empty };
        }
    }

    /// Seed destructible Blocks over the remaining floor.
    /// Cells are visited in row-major order, so the same RNG seed
    /// always yields the same layout. Returns the number placed.
    pub fn place_blocks<R: Rng + ?Sized>(&mut self, density: f32, rng: &mut R) -> usize {
        let density = density.clamp(0.0, 1.0);
        let mut placed = 0;
        for cell in &mut self.cells {
            if cell.kind != CellKind::Empty { continue; }
            if Self::is_spawn_protected(cell.x, cell.y) { continue; }
            if rng.random::<f32>() < density {
                cell.kind = CellKind::Block;
                placed += 1;
            }
        }
        placed
    }

    /// Bury the exit under a random Block. With no Blocks available the
    /// exit is laid openly on a random unprotected floor cell.
    pub fn hide_exit<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(usize, usize)> {
        let blocks: Vec<usize> = self.block_indices(|_| true);
        if let Some(&i) = blocks.choose(rng) {
            self.cells[i].has_hidden_exit = true;
            return Some(self.cells[i].pos());
        }

        let floor: Vec<usize> = self.cells.iter().enumerate()
            .filter(|(_, c)| c.kind == CellKind::Empty && !Self::is_spawn_protected(c.x, c.y))
            .map(|(i, _)| i)
            .collect();
        let &i = floor.choose(rng)?;
        self.cells[i].kind = CellKind::Exit;
        Some(self.cells[i].pos())
    }

    /// Bury each power-up under a distinct Block that hides nothing yet.
    /// Returns how many were placed (fewer if Blocks run out).
    pub fn hide_power_ups<R: Rng + ?Sized>(&mut self, power_ups: &[PowerUp], rng: &mut R) -> usize {
        let mut candidates = self.block_indices(|c| !c.has_hidden_exit && c.hidden_power_up.is_none());
        let mut placed = 0;
        for &pu in power_ups {
            if candidates.is_empty() { break; }
            let pick = rng.random_range(0..candidates.len());
            let i = candidates.swap_remove(pick);
            self.cells[i].hidden_power_up = Some(pu);
            placed += 1;
        }
        placed
    }

    fn block_indices(&self, keep: impl Fn(&Cell) -> bool) -> Vec<usize> {
        self.cells.iter().enumerate()
            .filter(|(_, c)| c.kind == CellKind::Block && keep(c))
            .map(|(i, _)| i)
            .collect()
    }
}

// ══════════════════════════════════════════════════════════════
// Bomb arena
// ══════════════════════════════════════════════════════════════

impl Grid {
    /// Arm a bomb on a floor cell. Fails on Walls, Blocks and occupied cells.
    pub fn place_bomb(&mut self, x: usize, y: usize, range: u32, fuse: f32) -> Option<BombId> {
        if !self.get(x, y)?.kind.is_floor() || self.bomb_at(x, y).is_some() { return None; }

        let bomb = Bomb::new(x, y, range, fuse);
        let id = match self.bombs.iter().position(|s| s.is_none()) {
            Some(slot) => {
                self.bombs[slot] = Some(bomb);
                BombId(slot)
            }
            None => {
                self.bombs.push(Some(bomb));
                BombId(self.bombs.len() - 1)
            }
        };
        if let Some(cell) = self.get_mut(x, y) {
            cell.bomb = Some(id);
        }
        Some(id)
    }

    pub fn bomb(&self, id: BombId) -> Option<&Bomb> {
        self.bombs.get(id.0).and_then(|s| s.as_ref())
    }

    pub fn bomb_mut(&mut self, id: BombId) -> Option<&mut Bomb> {
        self.bombs.get_mut(id.0).and_then(|s| s.as_mut())
    }

    pub fn bomb_at(&self, x: usize, y: usize) -> Option<BombId> {
        self.get(x, y).and_then(|c| c.bomb)
    }

    pub fn active_bombs(&self) -> impl Iterator<Item = (BombId, &Bomb)> + '_ {
        self.bombs.iter().enumerate().filter_map(|(i, s)| match s {
            Some(b) if b.is_active => Some((BombId(i), b)),
            _ => None,
        })
    }

    pub fn active_bomb_count(&self) -> usize {
        self.active_bombs().count()
    }

    /// Take a bomb out of the arena and off its cell.
    pub fn remove_bomb(&mut self, id: BombId) -> Option<Bomb> {
        let bomb = self.bombs.get_mut(id.0)?.take()?;
        if let Some(cell) = self.get_mut(bomb.x, bomb.y) {
            if cell.bomb == Some(id) {
                cell.bomb = None;
            }
        }
        Some(bomb)
    }
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

impl Grid {
    /// Advance flame and destruction timers. Blocks that finish crumbling
    /// turn into floor (or the exit) and surface their hidden power-up.
    pub fn tick_timers(&mut self, dt: f32) -> Vec<Reveal> {
        let mut reveals = Vec::new();
        for cell in &mut self.cells {
            if cell.flame_timer > 0.0 {
                cell.flame_timer = (cell.flame_timer - dt).max(0.0);
            }
            if cell.destroy_timer > 0.0 {
                cell.destroy_timer = (cell.destroy_timer - dt).max(0.0);
                if cell.destroy_timer == 0.0 && cell.kind == CellKind::Block {
                    let exit = cell.has_hidden_exit;
                    cell.kind = if exit { CellKind::Exit } else { CellKind::Empty };
                    cell.has_hidden_exit = false;
                    cell.power_up = cell.hidden_power_up.take();
                    reveals.push(Reveal { x: cell.x, y: cell.y, exit, power_up: cell.power_up });
                }
            }
        }
        reveals
    }
}

// ══════════════════════════════════════════════════════════════
// Test helpers
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
impl Grid {
    /// Build a grid from a string diagram.
    /// Legend: '#'=Wall  '+'=Block  'E'=Exit  anything else=Empty
    pub(crate) fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows[0].len();
        let mut grid = Grid::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if let Some(cell) = grid.get_mut(x, y) {
                    cell.kind = match ch {
                        '#' => CellKind::Wall,
                        '+' => CellKind::Block,
                        'E' => CellKind::Exit,
                        _ => CellKind::Empty,
                    };
                }
            }
        }
        grid
    }

    /// Classic 11×9 arena with no Blocks.
    pub(crate) fn classic() -> Self {
        let mut grid = Grid::new(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        grid.setup_classic_pattern();
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // ── Lookup ──

    #[test]
    fn try_get_cell_matches_coordinates_in_bounds() {
        let grid = Grid::classic();
        for y in 0..grid.height() as i32 {
            for x in 0..grid.width() as i32 {
                let c = grid.try_get_cell(x, y).unwrap();
                assert_eq!((c.x() as i32, c.y() as i32), (x, y));
            }
        }
    }

    #[test]
    fn try_get_cell_out_of_bounds_is_none() {
        let grid = Grid::classic();
        let (w, h) = (grid.width() as i32, grid.height() as i32);
        for &(x, y) in &[(-1, 0), (0, -1), (w, 0), (0, h), (w, h), (-5, -5), (100, 3)] {
            assert!(grid.try_get_cell(x, y).is_none(), "({x},{y}) should be absent");
        }
        assert!(grid.get(11, 0).is_none());
        assert_eq!(grid.kind_at(50, 50), CellKind::Wall);
    }

    // ── Walkability ──

    #[test]
    fn wall_never_walkable_or_blast_passable() {
        let grid = Grid::from_rows(&["#"]);
        let c = grid.get(0, 0).unwrap();
        for &walls in &[false, true] {
            for &bombs in &[false, true] {
                assert!(!c.is_walkable(walls, bombs));
            }
            assert!(!c.can_explosion_pass(walls));
        }
    }

    #[test]
    fn block_needs_wall_pass() {
        let grid = Grid::from_rows(&["+"]);
        let c = grid.get(0, 0).unwrap();
        assert!(!c.is_walkable(false, false));
        assert!(c.is_walkable(true, false));
        assert!(!c.can_explosion_pass(true));
    }

    #[test]
    fn bomb_needs_bomb_pass() {
        let mut grid = Grid::from_rows(&["   "]);
        grid.place_bomb(1, 0, 1, 2.0).unwrap();
        assert!(!grid.is_walkable(1, 0, false, false));
        assert!(!grid.is_walkable(1, 0, true, false));
        assert!(grid.is_walkable(1, 0, false, true));
        assert!(grid.get(1, 0).unwrap().can_explosion_pass(false));
    }

    #[test]
    fn owner_may_stand_on_fresh_bomb() {
        let mut grid = Grid::from_rows(&["   "]);
        let id = grid.place_bomb(1, 0, 1, 2.0).unwrap();
        let player = Player::new(1, 0);
        assert!(grid.is_walkable_for_player(1, 0, &player));

        grid.bomb_mut(id).unwrap().player_on_top = false;
        assert!(!grid.is_walkable_for_player(1, 0, &player));

        let stranger = Player::new(0, 0);
        grid.bomb_mut(id).unwrap().player_on_top = true;
        assert!(!grid.is_walkable_for_player(1, 0, &stranger));
    }

    #[test]
    fn unsigned_lookup_agrees_with_signed() {
        let grid = Grid::classic();
        for cell in grid.cells() {
            let (x, y) = cell.pos();
            let signed = grid.try_get_cell(x as i32, y as i32).unwrap();
            assert_eq!(signed.pos(), grid.get(x, y).unwrap().pos());
        }
        assert!(grid.get(usize::MAX, 0).is_none());
        assert!(grid.get(1, i32::MAX as usize + 1).is_none());
        assert_eq!(grid.neighbors(usize::MAX, 1).count(), 0);
    }

    #[test]
    fn out_of_bounds_not_walkable() {
        let grid = Grid::from_rows(&["  "]);
        assert!(!grid.is_walkable(2, 0, true, true));
        assert!(grid.try_get_cell(0, 1).is_none());
    }

    // ── Neighbours ──

    #[test]
    fn neighbors_in_corner_and_centre() {
        let grid = Grid::from_rows(&[
            "   ",
            "   ",
            "   ",
        ]);
        let corner: Vec<_> = grid.neighbors(0, 0).map(|c| c.pos()).collect();
        assert_eq!(corner, vec![(0, 1), (1, 0)]);
        let centre: Vec<_> = grid.neighbors(1, 1).map(|c| c.pos()).collect();
        assert_eq!(centre, vec![(1, 0), (1, 2), (0, 1), (2, 1)]);
    }

    // ── Coordinate mapping ──

    #[test]
    fn pixel_mapping() {
        let grid = Grid::classic().with_tile_size(10.0);
        assert_eq!(grid.pixel_to_grid(0.0, 0.0), Some((0, 0)));
        assert_eq!(grid.pixel_to_grid(19.9, 35.0), Some((1, 3)));
        assert_eq!(grid.pixel_to_grid(-1.0, 5.0), None);
        assert_eq!(grid.pixel_to_grid(110.0, 5.0), None);
        assert_eq!(grid.grid_to_pixel(2, 3), (25.0, 35.0));
        let (px, py) = grid.grid_to_pixel(7, 4);
        assert_eq!(grid.pixel_to_grid(px, py), Some((7, 4)));
    }

    // ── Authoring ──

    #[test]
    fn classic_pattern_wall_count() {
        let grid = Grid::classic();
        // 36 border + 12 interior pillars
        assert_eq!(grid.count_cells(CellKind::Wall), 48);
        assert_eq!(grid.count_cells(CellKind::Empty), 51);
        assert_eq!(grid.kind_at(2, 2), CellKind::Wall);
        assert_eq!(grid.kind_at(1, 1), CellKind::Empty);
        assert_eq!(grid.kind_at(3, 2), CellKind::Empty);
    }

    #[test]
    fn place_blocks_is_reproducible() {
        let mut a = Grid::classic();
        let mut b = Grid::classic();
        a.place_blocks(0.4, &mut StdRng::seed_from_u64(7));
        b.place_blocks(0.4, &mut StdRng::seed_from_u64(7));
        let ka: Vec<_> = a.cells().map(|c| c.kind).collect();
        let kb: Vec<_> = b.cells().map(|c| c.kind).collect();
        assert_eq!(ka, kb);
    }

    #[test]
    fn full_density_spares_spawn_area() {
        let mut grid = Grid::classic();
        let placed = grid.place_blocks(1.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(placed, 48);
        for &(x, y) in &SPAWN_PROTECTED {
            assert_eq!(grid.kind_at(x, y), CellKind::Empty);
        }
    }

    #[test]
    fn zero_density_places_nothing() {
        let mut grid = Grid::classic();
        assert_eq!(grid.place_blocks(0.0, &mut StdRng::seed_from_u64(3)), 0);
        assert_eq!(grid.count_cells(CellKind::Block), 0);
    }

    #[test]
    fn exit_hidden_under_block() {
        let mut grid = Grid::classic();
        grid.place_blocks(0.5, &mut StdRng::seed_from_u64(11));
        let (x, y) = grid.hide_exit(&mut StdRng::seed_from_u64(11)).unwrap();
        let c = grid.get(x, y).unwrap();
        assert_eq!(c.kind, CellKind::Block);
        assert!(c.has_hidden_exit);
    }

    #[test]
    fn exit_laid_openly_without_blocks() {
        let mut grid = Grid::classic();
        let (x, y) = grid.hide_exit(&mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(grid.kind_at(x, y), CellKind::Exit);
        assert!(!Grid::is_spawn_protected(x, y));
    }

    #[test]
    fn power_ups_avoid_exit_block() {
        let mut grid = Grid::from_rows(&["++"]);
        grid.get_mut(0, 0).unwrap().has_hidden_exit = true;
        let mut rng = StdRng::seed_from_u64(5);
        let placed = grid.hide_power_ups(&[PowerUp::Fire, PowerUp::Speed], &mut rng);
        assert_eq!(placed, 1);
        assert_eq!(grid.get(0, 0).unwrap().hidden_power_up, None);
        assert!(grid.get(1, 0).unwrap().hidden_power_up.is_some());
    }

    // ── Bombs ──

    #[test]
    fn bombs_only_on_free_floor() {
        let mut grid = Grid::from_rows(&["#+ E"]);
        assert!(grid.place_bomb(0, 0, 1, 2.0).is_none());
        assert!(grid.place_bomb(1, 0, 1, 2.0).is_none());
        assert!(grid.place_bomb(2, 0, 1, 2.0).is_some());
        assert!(grid.place_bomb(2, 0, 1, 2.0).is_none());
        assert!(grid.place_bomb(3, 0, 1, 2.0).is_some());
        assert!(grid.place_bomb(9, 0, 1, 2.0).is_none());
        assert_eq!(grid.active_bomb_count(), 2);
    }

    #[test]
    fn removed_bomb_slot_is_reused() {
        let mut grid = Grid::from_rows(&["   "]);
        let a = grid.place_bomb(0, 0, 1, 2.0).unwrap();
        let _b = grid.place_bomb(1, 0, 1, 2.0).unwrap();
        let bomb = grid.remove_bomb(a).unwrap();
        assert_eq!((bomb.x, bomb.y), (0, 0));
        assert_eq!(grid.bomb_at(0, 0), None);
        assert!(grid.remove_bomb(a).is_none());
        let c = grid.place_bomb(2, 0, 1, 2.0).unwrap();
        assert_eq!(c, a);
        assert_eq!(grid.bomb_at(2, 0), Some(c));
    }

    // ── Reset ──

    #[test]
    fn reset_recycles_cells() {
        let mut grid = Grid::classic();
        grid.place_blocks(0.5, &mut StdRng::seed_from_u64(9));
        grid.place_bomb(1, 1, 2, 2.0);
        grid.reset();
        assert_eq!(grid.count_cells(CellKind::Empty), grid.width() * grid.height());
        assert_eq!(grid.active_bomb_count(), 0);
        assert_eq!(grid.try_get_cell(4, 3).unwrap().pos(), (4, 3));
    }

    #[test]
    fn clear_dynamic_keeps_layout() {
        let mut grid = Grid::from_rows(&["+  "]);
        grid.place_bomb(1, 0, 1, 2.0);
        grid.get_mut(2, 0).unwrap().flame_timer = 0.5;
        grid.get_mut(0, 0).unwrap().destroy_timer = 0.5;
        grid.clear_dynamic_elements();
        assert_eq!(grid.kind_at(0, 0), CellKind::Block);
        assert!(!grid.get(0, 0).unwrap().is_crumbling());
        assert_eq!(grid.bomb_at(1, 0), None);
        assert!(!grid.get(2, 0).unwrap().is_burning());
    }

    // ── Timers ──

    #[test]
    fn crumbling_block_reveals_payload() {
        let mut grid = Grid::from_rows(&["++"]);
        {
            let c = grid.get_mut(0, 0).unwrap();
            c.hidden_power_up = Some(PowerUp::Fire);
            c.destroy_timer = 0.3;
        }
        {
            let c = grid.get_mut(1, 0).unwrap();
            c.has_hidden_exit = true;
            c.destroy_timer = 0.3;
        }
        assert!(grid.tick_timers(0.2).is_empty());
        assert!(!grid.is_walkable(0, 0, false, false));

        let reveals = grid.tick_timers(0.2);
        assert_eq!(reveals.len(), 2);
        assert_eq!(grid.kind_at(0, 0), CellKind::Empty);
        assert_eq!(grid.get(0, 0).unwrap().power_up, Some(PowerUp::Fire));
        assert_eq!(grid.kind_at(1, 0), CellKind::Exit);
        assert!(reveals.iter().any(|r| r.exit && (r.x, r.y) == (1, 0)));
    }
}
