/// Grid search: A* shortest path and nearest-safe-cell BFS.
///
/// Movement is 4-directional with unit cost, so A* with a Manhattan
/// heuristic is exact and the waypoint count equals the path cost.
///
/// Two distinct exclusion predicates, chosen per call site:
///   - `avoid_bombs`: cells holding a bomb are not traversable
///   - `danger`     : cells inside the given danger zone are not traversable
///
/// Excluded cells are removed from the graph, not penalized: a path through
/// them is never produced. Failure is an empty result, never a panic.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use super::explosion::DangerZone;
use super::grid::{Cell, Grid};

/// Who is walking and what they refuse to walk through.
#[derive(Clone, Copy, Debug, Default)]
pub struct Traversal<'a> {
    pub can_pass_walls: bool,
    pub avoid_bombs: bool,
    pub danger: Option<&'a DangerZone>,
}

impl<'a> Traversal<'a> {
    pub fn new(can_pass_walls: bool) -> Self {
        Traversal { can_pass_walls, avoid_bombs: false, danger: None }
    }

    pub fn avoiding_bombs(mut self) -> Self {
        self.avoid_bombs = true;
        self
    }

    pub fn avoiding(mut self, danger: &'a DangerZone) -> Self {
        self.danger = Some(danger);
        self
    }

    /// Can the search step onto this cell?
    pub fn allows(&self, cell: &Cell) -> bool {
        cell.is_walkable(self.can_pass_walls, !self.avoid_bombs)
            && !self.danger.map_or(false, |d| d.contains(cell.x(), cell.y()))
    }
}

pub fn manhattan(a: (usize, usize), b: (usize, usize)) -> u32 {
    (a.0.abs_diff(b.0) + a.1.abs_diff(b.1)) as u32
}

// ══════════════════════════════════════════════════════════════
// A*
// ══════════════════════════════════════════════════════════════

/// Shortest path from `from` to `to`, excluding the origin and including
/// the target. Empty when unreachable or when `from == to`.
///
/// Ties are broken by lower f, then lower h, then insertion order, with
/// neighbours expanded Up, Down, Left, Right: identical inputs always
/// produce the identical path.
pub fn find_path(
    grid: &Grid,
    from: (usize, usize),
    to: (usize, usize),
    traversal: &Traversal,
) -> Vec<(usize, usize)> {
    if from == to || grid.get(from.0, from.1).is_none() { return vec![]; }
    match grid.get(to.0, to.1) {
        Some(target) if traversal.allows(target) => {}
        _ => return vec![],
    }

    let w = grid.width();
    let n = w * grid.height();
    let idx = |(x, y): (usize, usize)| y * w + x;
    let start = idx(from);
    let goal = idx(to);

    let mut g_score = vec![u32::MAX; n];
    let mut came_from: Vec<Option<usize>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut open: BinaryHeap<Reverse<(u32, u32, u64, usize)>> = BinaryHeap::with_capacity(64);
    let mut seq: u64 = 0;

    g_score[start] = 0;
    let h0 = manhattan(from, to);
    open.push(Reverse((h0, h0, seq, start)));

    while let Some(Reverse((_, _, _, current))) = open.pop() {
        if closed[current] { continue; }
        closed[current] = true;
        if current == goal {
            return reconstruct(&came_from, start, goal, w);
        }

        for cell in grid.neighbors(current % w, current / w) {
            let next = idx(cell.pos());
            if closed[next] || !traversal.allows(cell) { continue; }

            let tentative = g_score[current] + 1;
            if tentative < g_score[next] {
                g_score[next] = tentative;
                came_from[next] = Some(current);
                let h = manhattan(cell.pos(), to);
                seq += 1;
                open.push(Reverse((tentative + h, h, seq, next)));
            }
        }
    }

    vec![]
}

fn reconstruct(came_from: &[Option<usize>], start: usize, goal: usize, w: usize) -> Vec<(usize, usize)> {
    let mut path = Vec::new();
    let mut node = goal;
    while node != start {
        path.push((node % w, node / w));
        match came_from[node] {
            Some(prev) => node = prev,
            None => return vec![],
        }
    }
    path.reverse();
    path
}

// ══════════════════════════════════════════════════════════════
// Nearest safe cell (BFS)
// ══════════════════════════════════════════════════════════════

/// Nearest cell (by step count) not in `danger`, reachable by walking.
/// Dangerous walkable cells are crossed on the way but never returned.
/// Bombs block the search. Returns the origin itself if it is safe.
pub fn find_safe_cell(
    grid: &Grid,
    from: (usize, usize),
    danger: &DangerZone,
    can_pass_walls: bool,
) -> Option<(usize, usize)> {
    grid.get(from.0, from.1)?;
    if !danger.contains(from.0, from.1) { return Some(from); }

    let w = grid.width();
    let mut visited = vec![false; w * grid.height()];
    visited[from.1 * w + from.0] = true;
    let mut queue: VecDeque<(usize, usize)> = VecDeque::with_capacity(32);
    queue.push_back(from);

    while let Some((cx, cy)) = queue.pop_front() {
        for cell in grid.neighbors(cx, cy) {
            if !cell.is_walkable(can_pass_walls, false) { continue; }
            let (nx, ny) = cell.pos();
            let i = ny * w + nx;
            if visited[i] { continue; }
            if !danger.contains(nx, ny) { return Some((nx, ny)); }
            visited[i] = true;
            queue.push_back((nx, ny));
        }
    }
    None
}
