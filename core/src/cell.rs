use serde::{Deserialize, Serialize};

/// One square of the shared grid.
///
/// `is_mine` and `neighbor_mines` are fixed when the board is generated, only the player-visible flags change.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    pub neighbor_mines: u8,
}

impl Cell {
    /// Hidden and not flagged, the only state a reveal acts on.
    pub const fn is_hidden(self) -> bool {
        !self.is_revealed && !self.is_flagged
    }
}
