//! Blast Arena: bomb-placement arena with tiered enemy AI.
//!
//! The binary in `main.rs` drives the terminal game; the modules here are
//! usable on their own (grid, blasts, pathfinding, AI, simulation step).

pub mod config;
pub mod domain;
pub mod sim;
pub mod ui;

pub use config::GameConfig;
pub use domain::ai::EnemyAi;
pub use domain::grid::Grid;
pub use sim::world::WorldState;
