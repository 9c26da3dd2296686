use ndarray::Array2;

use super::*;

/// Uniform generator: draws `(row, col)` pairs and retries on collision until every mine is placed.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: BoardConfig) -> Board {
        use rand::prelude::*;

        let (rows, cols) = config.size;
        let total_cells = config.total_cells();

        // rejection sampling would spin forever on a full board
        let mines = if config.mines >= total_cells {
            log::warn!(
                "Requested {} mines but only {} cells, keeping one cell safe",
                config.mines,
                total_cells
            );
            total_cells.saturating_sub(1)
        } else {
            config.mines
        };

        let mut mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut placed = 0;
        let mut draws: u32 = 0;

        while placed < mines {
            draws += 1;
            let coords: Coord2 = (rng.random_range(0..rows), rng.random_range(0..cols));
            let cell = &mut mask[coords.to_nd_index()];
            if !*cell {
                *cell = true;
                placed += 1;
            }
        }
        log::debug!(
            "Placed {} mines on {}x{} in {} draws (seed {})",
            placed,
            rows,
            cols,
            draws,
            self.seed
        );

        Board::from_mine_mask(&mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn true_neighbor_count(board: &Board, coords: Coord2) -> u8 {
        board
            .iter_neighbors(coords)
            .filter(|&pos| board[pos].is_mine)
            .count() as u8
    }

    #[test]
    fn exact_mine_count_and_neighbor_counts() {
        for tier in Tier::ALL {
            for seed in 0..20 {
                let config = tier.config();
                let board = RandomBoardGenerator::new(seed).generate(config);

                assert_eq!(board.size(), config.size);
                assert_eq!(board.mine_count(), config.mines);
                assert_eq!(
                    board.cells().iter().filter(|cell| cell.is_mine).count(),
                    config.mines as usize
                );
                for ((row, col), cell) in board.cells().indexed_iter() {
                    let coords = (row as Coord, col as Coord);
                    assert!(!cell.is_revealed && !cell.is_flagged);
                    if !cell.is_mine {
                        assert_eq!(cell.neighbor_mines, true_neighbor_count(&board, coords));
                    }
                }
            }
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let config = Tier::Medium.config();
        let a = RandomBoardGenerator::new(42).generate(config);
        let b = RandomBoardGenerator::new(42).generate(config);
        assert_eq!(a, b);
    }

    #[test]
    fn densest_valid_board_leaves_one_safe_cell() {
        let config = BoardConfig::new((3, 3), 8).unwrap();
        let board = RandomBoardGenerator::new(7).generate(config);
        assert_eq!(board.safe_cell_count(), 1);
    }

    #[test]
    fn overfull_request_is_capped() {
        let board = RandomBoardGenerator::new(1).generate(BoardConfig::new_unchecked((2, 2), 9));
        assert_eq!(board.mine_count(), 3);
    }

    #[test]
    fn zero_mines() {
        let board = RandomBoardGenerator::new(3).generate(BoardConfig::new((1, 1), 0).unwrap());
        assert_eq!(board.mine_count(), 0);
        assert_eq!(board[(0, 0)].neighbor_mines, 0);
    }
}
