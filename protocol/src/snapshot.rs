use sapper_core::{CellCount, Coord, Match, MatchStatus, Millis};
use serde::{Deserialize, Serialize};

/// How much of the hidden board a snapshot exposes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotMode {
    /// Every field of every cell, mines included.
    #[default]
    Full,
    /// While the match is running, unrevealed cells carry neither mine nor count.
    Concealed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub row: Coord,
    pub col: Coord,
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    pub neighbor_mines: u8,
}

/// Full copy of the match as broadcast to every subscriber.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub grid: Vec<Vec<CellView>>,
    pub rows: Coord,
    pub cols: Coord,
    pub mines: CellCount,
    /// Mines minus flags, negative when over-flagged.
    pub mines_left: i32,
    pub status: MatchStatus,
    pub start_time: Option<Millis>,
    pub end_time: Option<Millis>,
    pub time_limit: u32,
}

impl MatchSnapshot {
    pub fn from_match(game: &Match, mode: SnapshotMode) -> Self {
        let (rows, cols) = game.size();
        let conceal = mode == SnapshotMode::Concealed && !game.is_finished();

        let grid = (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| {
                        let cell = game.cell_at((row, col));
                        let hide = conceal && !cell.is_revealed;
                        CellView {
                            row,
                            col,
                            is_mine: cell.is_mine && !hide,
                            is_revealed: cell.is_revealed,
                            is_flagged: cell.is_flagged,
                            neighbor_mines: if hide { 0 } else { cell.neighbor_mines },
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            grid,
            rows,
            cols,
            mines: game.total_mines(),
            mines_left: game.mines_left(),
            status: game.status(),
            start_time: game.started_at(),
            end_time: game.ended_at(),
            time_limit: game.time_limit_secs(),
        }
    }

    pub fn cell(&self, row: Coord, col: Coord) -> Option<&CellView> {
        self.grid.get(usize::from(row))?.get(usize::from(col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sapper_core::Board;

    fn game() -> Match {
        let board = Board::from_mine_coords((3, 3), &[(0, 0)]).unwrap();
        let mut game = Match::new(board, 0);
        game.reveal((1, 1), 0).unwrap();
        game.toggle_flag((0, 0)).unwrap();
        game
    }

    #[test]
    fn full_snapshot_copies_every_field() {
        let snapshot = MatchSnapshot::from_match(&game(), SnapshotMode::Full);

        assert_eq!((snapshot.rows, snapshot.cols, snapshot.mines), (3, 3, 1));
        assert_eq!(snapshot.mines_left, 0);
        assert_eq!(snapshot.grid.len(), 3);
        assert!(snapshot.grid.iter().all(|row| row.len() == 3));

        let mine = snapshot.cell(0, 0).unwrap();
        assert!(mine.is_mine && mine.is_flagged && !mine.is_revealed);
        let opened = snapshot.cell(1, 1).unwrap();
        assert!(opened.is_revealed);
        assert_eq!(opened.neighbor_mines, 1);
        assert_eq!((opened.row, opened.col), (1, 1));
        assert!(snapshot.cell(3, 0).is_none());
    }

    #[test]
    fn concealed_snapshot_hides_unrevealed_cells_while_playing() {
        let mut game = game();
        let concealed = MatchSnapshot::from_match(&game, SnapshotMode::Concealed);

        assert_eq!(concealed.status, MatchStatus::Playing);
        assert!(!concealed.cell(0, 0).unwrap().is_mine);
        assert!(concealed.cell(0, 0).unwrap().is_flagged);
        assert_eq!(concealed.cell(1, 1).unwrap().neighbor_mines, 1);
        assert_eq!(concealed.mines, 1);

        game.toggle_flag((0, 0)).unwrap();
        game.reveal((0, 0), 10).unwrap();
        let ended = MatchSnapshot::from_match(&game, SnapshotMode::Concealed);

        assert_eq!(ended.status, MatchStatus::Lost);
        assert_eq!(ended.end_time, Some(10));
        assert!(ended.cell(0, 0).unwrap().is_mine);
    }
}
