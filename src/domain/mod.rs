pub mod ai;
pub mod entity;
pub mod explosion;
pub mod grid;
pub mod motion;
pub mod pathfinding;
pub mod tile;
