/// Events emitted during a simulation step.
/// The game loop logs them and the renderer may flash on them.

use crate::domain::entity::Intelligence;
use crate::domain::tile::PowerUp;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    BombPlaced { x: usize, y: usize },
    BombDetonated { x: usize, y: usize, cells: usize },
    BlockDestroyed { x: usize, y: usize },
    PowerUpRevealed { x: usize, y: usize, power_up: PowerUp },
    PowerUpBurned { x: usize, y: usize },
    PowerUpCollected { power_up: PowerUp },
    ExitRevealed { x: usize, y: usize },
    EnemyKilled { id: usize, intelligence: Intelligence },
    PlayerKilled,
    LevelCleared,
}
