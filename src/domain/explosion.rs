/// Blast propagation and the danger zone.
///
/// ## Propagation
///
/// From the bomb's cell, walk outward in each cardinal direction up to
/// `range` steps:
///   - grid edge or Wall → stop, cell NOT reached
///   - Block             → cell reached, then stop (absorbs the blast)
///   - anything else     → cell reached, keep going
///
/// Bombs in the path do not stop the blast; they are set off by it.
///
/// ## Danger zone
///
/// Union of every active bomb's eventual blast plus every cell that is
/// burning right now. Computed once per tick and shared read-only by all
/// actors, so no actor sees another's mid-tick changes.

use std::collections::VecDeque;

use log::debug;

use super::entity::{BombId, Direction};
use super::grid::Grid;
use super::tile::PowerUp;

/// Cells a blast from (x, y) with `range` reaches, origin first.
pub fn blast_cells(grid: &Grid, x: usize, y: usize, range: u32) -> Vec<(usize, usize)> {
    let mut cells = Vec::with_capacity(1 + 4 * range as usize);
    if grid.get(x, y).is_none() { return cells; }
    cells.push((x, y));

    let (ox, oy) = (x as i32, y as i32);
    for dir in Direction::CARDINALS {
        let (dx, dy) = dir.delta();
        for step in 1..=range as i32 {
            let Some(cell) = grid.try_get_cell(ox + dx * step, oy + dy * step) else { break };
            if cell.kind.is_wall() { break; }
            cells.push(cell.pos());
            if !cell.can_explosion_pass(false) { break; }
        }
    }
    cells
}

// ══════════════════════════════════════════════════════════════
// Danger zone
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct DangerZone {
    width: usize,
    height: usize,
    marked: Vec<bool>,
    count: usize,
}

impl DangerZone {
    pub fn empty(width: usize, height: usize) -> Self {
        DangerZone { width, height, marked: vec![false; width * height], count: 0 }
    }

    /// Every active bomb's blast path, nothing else.
    pub fn from_bombs(grid: &Grid) -> Self {
        let mut zone = DangerZone::empty(grid.width(), grid.height());
        for (_, bomb) in grid.active_bombs() {
            for (x, y) in blast_cells(grid, bomb.x, bomb.y, bomb.range) {
                zone.mark(x, y);
            }
        }
        zone
    }

    /// Bomb blast paths plus cells burning this tick.
    pub fn compute(grid: &Grid) -> Self {
        let mut zone = Self::from_bombs(grid);
        for cell in grid.cells().filter(|c| c.is_burning()) {
            zone.mark(cell.x(), cell.y());
        }
        zone
    }

    pub fn mark(&mut self, x: usize, y: usize) {
        if x >= self.width || y >= self.height { return; }
        let i = y * self.width + x;
        if !self.marked[i] {
            self.marked[i] = true;
            self.count += 1;
        }
    }

    /// Out-of-bounds cells are never dangerous (they are never reachable).
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.marked[y * self.width + x]
    }

    pub fn len(&self) -> usize { self.count }
    pub fn is_empty(&self) -> bool { self.count == 0 }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let w = self.width;
        self.marked.iter().enumerate()
            .filter(|(_, m)| **m)
            .map(move |(i, _)| (i % w, i / w))
    }
}

// ══════════════════════════════════════════════════════════════
// Detonation
// ══════════════════════════════════════════════════════════════

/// One bomb's detonation result.
#[derive(Clone, Debug)]
pub struct Blast {
    pub x: usize,
    pub y: usize,
    pub cells: Vec<(usize, usize)>,
    pub blocks_hit: Vec<(usize, usize)>,
    pub power_ups_burned: Vec<(usize, usize, PowerUp)>,
}

/// Set off `first` and every bomb its flames reach, breadth-first.
/// Bombs are removed from the grid, reached cells start burning, reached
/// Blocks start crumbling and exposed power-ups are burned.
pub fn detonate(grid: &mut Grid, first: BombId, flame_secs: f32, destroy_secs: f32) -> Vec<Blast> {
    let mut blasts = Vec::new();
    let mut queue = VecDeque::from([first]);

    while let Some(id) = queue.pop_front() {
        let Some(bomb) = grid.remove_bomb(id) else { continue };
        let cells = blast_cells(grid, bomb.x, bomb.y, bomb.range);
        let mut blast = Blast {
            x: bomb.x,
            y: bomb.y,
            cells: Vec::with_capacity(cells.len()),
            blocks_hit: vec![],
            power_ups_burned: vec![],
        };

        for (cx, cy) in cells {
            let Some(cell) = grid.get_mut(cx, cy) else { continue };
            cell.flame_timer = cell.flame_timer.max(flame_secs);
            if cell.kind.is_destructible() {
                if cell.destroy_timer <= 0.0 {
                    cell.destroy_timer = destroy_secs.max(f32::EPSILON);
                    blast.blocks_hit.push((cx, cy));
                }
            } else if let Some(pu) = cell.power_up.take() {
                blast.power_ups_burned.push((cx, cy, pu));
            }
            if let Some(chained) = cell.bomb {
                queue.push_back(chained);
            }
            blast.cells.push((cx, cy));
        }

        debug!(
            "Bomb at ({}, {}) detonated: {} cells, {} blocks hit",
            blast.x, blast.y, blast.cells.len(), blast.blocks_hit.len(),
        );
        blasts.push(blast);
    }
    blasts
}
