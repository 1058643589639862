/// Cell kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellKind {
    Empty,
    Wall,  // Indestructible, blocks everything
    Block, // Destructible, may hide a power-up or the exit
    Exit,  // Level exit portal (revealed from a Block)
}

impl CellKind {
    /// Is this an indestructible wall?
    pub fn is_wall(self) -> bool {
        matches!(self, CellKind::Wall)
    }

    /// Can a bomb blast destroy this cell?
    pub fn is_destructible(self) -> bool {
        matches!(self, CellKind::Block)
    }

    /// Is this floor an actor can stand on without any capability?
    pub fn is_floor(self) -> bool {
        matches!(self, CellKind::Empty | CellKind::Exit)
    }

    /// Does this cell stop a blast travelling through it?
    pub fn stops_blast(self) -> bool {
        matches!(self, CellKind::Wall | CellKind::Block)
    }
}

impl Default for CellKind {
    fn default() -> Self {
        CellKind::Empty
    }
}

/// Pickups hidden under Blocks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerUp {
    ExtraBomb,
    Fire,
    Speed,
    WallPass,
    BombPass,
    FlamePass,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_and_blocks_stop_blasts() {
        assert!(CellKind::Wall.stops_blast());
        assert!(CellKind::Block.stops_blast());
        assert!(!CellKind::Empty.stops_blast());
        assert!(!CellKind::Exit.stops_blast());
    }

    #[test]
    fn only_blocks_are_destructible() {
        assert!(CellKind::Block.is_destructible());
        assert!(!CellKind::Wall.is_destructible());
        assert!(!CellKind::Exit.is_destructible());
    }

    #[test]
    fn exit_is_floor() {
        assert!(CellKind::Exit.is_floor());
        assert!(CellKind::Empty.is_floor());
        assert!(!CellKind::Wall.is_floor());
    }
}
