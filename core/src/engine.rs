use alloc::collections::VecDeque;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Playing -> Won
/// - Playing -> Lost
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Playing,
    Won,
    Lost,
}

impl MatchStatus {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// One game on the shared board, from generation until it is won, lost, or replaced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    board: Board,
    status: MatchStatus,
    started_at: Option<Millis>,
    ended_at: Option<Millis>,
    time_limit_secs: u32,
    revealed_count: CellCount,
    flagged_count: CellCount,
    triggered_mine: Option<Coord2>,
}

impl Match {
    pub fn new(board: Board, now: Millis) -> Self {
        let time_limit_secs = timer::time_limit_secs(board.size());
        Self {
            board,
            status: MatchStatus::Playing,
            started_at: Some(now),
            ended_at: None,
            time_limit_secs,
            revealed_count: 0,
            flagged_count: 0,
            triggered_mine: None,
        }
    }

    pub fn generate(generator: impl BoardGenerator, config: BoardConfig, now: Millis) -> Self {
        let new_match = Self::new(generator.generate(config), now);
        log::info!(
            "New {}x{} match with {} mines, {}s on the clock",
            config.size.0,
            config.size.1,
            new_match.total_mines(),
            new_match.time_limit_secs
        );
        new_match
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.board.mine_count()
    }

    pub fn cell_at(&self, coords: Coord2) -> Cell {
        self.board[coords]
    }

    pub fn started_at(&self) -> Option<Millis> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Millis> {
        self.ended_at
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    /// The mine whose reveal lost the match, `None` for wins and timeouts.
    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// How many mines have not been flagged yet, negative when over-flagged.
    pub fn mines_left(&self) -> i32 {
        i32::from(self.board.mine_count()) - i32::from(self.flagged_count)
    }

    /// Safe cells that still have to be revealed.
    pub fn pending_safe_cells(&self) -> CellCount {
        self.board.safe_cell_count() - self.revealed_count
    }

    /// Seconds on the clock, frozen once the match ends.
    pub fn elapsed_secs(&self, now: Millis) -> u64 {
        match self.started_at {
            Some(start) => timer::elapsed_secs(start, self.ended_at.unwrap_or(now)),
            None => 0,
        }
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.board.validate_coords(coords)?;

        if !self.status.is_playing() {
            return Ok(MarkOutcome::NoChange);
        }

        let cell = &mut self.board[coords];
        if cell.is_revealed {
            return Ok(MarkOutcome::NoChange);
        }

        cell.is_flagged = !cell.is_flagged;
        if cell.is_flagged {
            self.flagged_count += 1;
        } else {
            self.flagged_count -= 1;
        }
        log::debug!("Flag at {:?} set to {}", coords, cell.is_flagged);
        Ok(MarkOutcome::Changed)
    }

    /// Reveals a hidden cell; flagged and already revealed cells are left alone.
    pub fn reveal(&mut self, coords: Coord2, now: Millis) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;
        let cell = self.board[coords];

        if !self.status.is_playing() || !cell.is_hidden() {
            return Ok(RevealOutcome::NoChange);
        }

        if cell.is_mine {
            log::debug!("Mine hit at {:?}", coords);
            self.board[coords].is_revealed = true;
            self.triggered_mine = Some(coords);
            self.finish(MatchStatus::Lost, now);
            return Ok(RevealOutcome::HitMine);
        }

        let opened = self.flood_reveal(coords);
        log::debug!("Reveal at {:?} opened {} cells", coords, opened);

        if self.pending_safe_cells() == 0 {
            self.finish(MatchStatus::Won, now);
            Ok(RevealOutcome::Won)
        } else {
            Ok(RevealOutcome::Revealed)
        }
    }

    /// Ends the match if its countdown ran out, returns whether it did on this call.
    pub fn check_timeout(&mut self, now: Millis) -> bool {
        if !self.status.is_playing() {
            return false;
        }
        let Some(start) = self.started_at else {
            return false;
        };

        let elapsed = timer::elapsed_secs(start, now);
        if elapsed < u64::from(self.time_limit_secs) {
            return false;
        }

        log::info!("Match timed out after {}s", elapsed);
        self.finish(MatchStatus::Lost, now);
        true
    }

    /// Opens `start` and, through zero cells, everything connected to it. Returns how many cells were opened.
    fn flood_reveal(&mut self, start: Coord2) -> CellCount {
        let mut opened = 0;
        let mut to_visit = VecDeque::from([start]);

        while let Some(coords) = to_visit.pop_front() {
            let cell = self.board[coords];
            // flags block the flood, the same way they block a direct reveal
            if !cell.is_hidden() || cell.is_mine {
                continue;
            }

            self.board[coords].is_revealed = true;
            opened += 1;
            log::trace!("Opened {:?} ({})", coords, cell.neighbor_mines);

            if cell.neighbor_mines == 0 {
                let board = &self.board;
                to_visit.extend(
                    board
                        .iter_neighbors(coords)
                        .filter(|&pos| board[pos].is_hidden()),
                );
            }
        }

        self.revealed_count += opened;
        opened
    }

    fn finish(&mut self, status: MatchStatus, now: Millis) {
        if self.status.is_finished() {
            return;
        }

        self.status = status;
        self.ended_at = Some(now);
        if status == MatchStatus::Lost {
            self.reveal_mines();
        }
        log::info!("Match {:?} after {}s", status, self.elapsed_secs(now));
    }

    /// Shows every mine, flags stay where the players put them.
    fn reveal_mines(&mut self) {
        for cell in self.board.cells_mut().iter_mut().filter(|cell| cell.is_mine) {
            cell.is_revealed = true;
        }
    }
}
