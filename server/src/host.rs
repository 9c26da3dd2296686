use sapper_core::{
    BoardConfig, CellCount, Coord, GameError, Match, Millis, RandomBoardGenerator,
};
use sapper_protocol::{ClientMessage, MatchSnapshot, SnapshotMode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Malformed message: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result of applying one client action.
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
    pub snapshot: MatchSnapshot,
    /// `false` when the action was a no-op and nobody needs to hear about it.
    pub changed: bool,
}

/// Owner of the live match, the only place the match is mutated from.
#[derive(Debug)]
pub struct GameHost {
    current: Match,
    next_seed: u64,
    mode: SnapshotMode,
}

impl GameHost {
    pub fn new(config: BoardConfig, seed: u64, mode: SnapshotMode, now: Millis) -> Self {
        let generator = RandomBoardGenerator::new(seed);
        Self {
            current: Match::generate(generator, config, now),
            next_seed: seed.wrapping_add(1),
            mode,
        }
    }

    pub fn current(&self) -> &Match {
        &self.current
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::from_match(&self.current, self.mode)
    }

    pub fn on_client_action(
        &mut self,
        action: ClientMessage,
        now: Millis,
    ) -> Result<Applied, HostError> {
        let changed = match action {
            ClientMessage::Reveal { row, col } => {
                self.current.reveal((row, col), now)?.has_update()
            }
            ClientMessage::Flag { row, col } => self.current.toggle_flag((row, col))?.has_update(),
            ClientMessage::Reset { rows, cols, mines } => {
                let config = reset_config(rows, cols, mines)?;
                self.reset(config, now);
                true
            }
        };

        Ok(Applied {
            snapshot: self.snapshot(),
            changed,
        })
    }

    /// Runs the timeout check, returns a snapshot only when the match expired just now.
    pub fn on_tick(&mut self, now: Millis) -> Option<MatchSnapshot> {
        self.current.check_timeout(now).then(|| self.snapshot())
    }

    fn reset(&mut self, config: BoardConfig, now: Millis) {
        let generator = RandomBoardGenerator::new(self.next_seed);
        self.next_seed = self.next_seed.wrapping_add(1);
        self.current = Match::generate(generator, config, now);
    }
}

/// Board for a reset request, any absent or zero field falls back to the whole default board.
pub fn reset_config(
    rows: Option<Coord>,
    cols: Option<Coord>,
    mines: Option<CellCount>,
) -> Result<BoardConfig, GameError> {
    match (rows, cols, mines) {
        (Some(rows @ 1..), Some(cols @ 1..), Some(mines @ 1..)) => {
            BoardConfig::new((rows, cols), mines)
        }
        _ => Ok(BoardConfig::DEFAULT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sapper_core::MatchStatus;

    const T0: Millis = 1_000_000;

    fn host() -> GameHost {
        GameHost::new(BoardConfig::DEFAULT, 5, SnapshotMode::Full, T0)
    }

    fn reset(rows: Option<Coord>, cols: Option<Coord>, mines: Option<CellCount>) -> ClientMessage {
        ClientMessage::Reset { rows, cols, mines }
    }

    fn first_safe(game: &Match) -> (Coord, Coord) {
        game.board()
            .cells()
            .indexed_iter()
            .find(|(_, cell)| !cell.is_mine)
            .map(|((row, col), _)| (row as Coord, col as Coord))
            .unwrap()
    }

    #[test]
    fn reset_defaults_missing_and_zero_fields() {
        assert_eq!(reset_config(None, None, None).unwrap(), BoardConfig::DEFAULT);
        assert_eq!(
            reset_config(Some(0), Some(0), Some(0)).unwrap(),
            BoardConfig::DEFAULT
        );
        assert_eq!(
            reset_config(Some(16), Some(30), None).unwrap(),
            BoardConfig::DEFAULT
        );
        assert_eq!(
            reset_config(Some(16), Some(30), Some(0)).unwrap(),
            BoardConfig::DEFAULT
        );
        assert_eq!(reset_config(Some(2), Some(2), None).unwrap(), BoardConfig::DEFAULT);
        assert_eq!(
            reset_config(Some(16), Some(30), Some(99)).unwrap(),
            BoardConfig::new_unchecked((16, 30), 99)
        );
    }

    #[test]
    fn partial_reset_starts_default_match() {
        let mut host = host();

        let applied = host.on_client_action(reset(Some(2), Some(2), None), T0).unwrap();

        assert!(applied.changed);
        assert_eq!((applied.snapshot.rows, applied.snapshot.cols), (10, 10));
        assert_eq!(applied.snapshot.mines, 15);
    }

    #[test]
    fn reset_replaces_match() {
        let mut host = host();
        let (row, col) = first_safe(host.current());
        host.on_client_action(ClientMessage::Reveal { row, col }, T0).unwrap();

        let applied = host
            .on_client_action(reset(Some(16), Some(16), Some(40)), T0 + 50)
            .unwrap();

        assert!(applied.changed);
        assert_eq!((applied.snapshot.rows, applied.snapshot.cols), (16, 16));
        assert_eq!(applied.snapshot.mines, 40);
        assert_eq!(applied.snapshot.time_limit, 300);
        assert_eq!(applied.snapshot.start_time, Some(T0 + 50));
        assert!(applied.snapshot.grid.iter().flatten().all(|cell| !cell.is_revealed));
    }

    #[test]
    fn consecutive_resets_use_fresh_layouts() {
        let mut host = host();
        let first = host.current().board().clone();

        host.on_client_action(reset(None, None, None), T0).unwrap();

        assert_ne!(host.current().board(), &first);
    }

    #[test]
    fn invalid_reset_keeps_current_match() {
        let mut host = host();
        let before = host.current().clone();

        let err = host
            .on_client_action(reset(Some(2), Some(2), Some(4)), T0)
            .unwrap_err();

        assert!(matches!(err, HostError::Game(GameError::TooManyMines)));
        assert_eq!(host.current(), &before);
    }

    #[test]
    fn moves_report_whether_anything_changed() {
        let mut host = host();
        let (row, col) = first_safe(host.current());

        let flagged = host.on_client_action(ClientMessage::Flag { row, col }, T0).unwrap();
        assert!(flagged.changed);
        assert!(flagged.snapshot.cell(row, col).unwrap().is_flagged);

        let blocked = host.on_client_action(ClientMessage::Reveal { row, col }, T0).unwrap();
        assert!(!blocked.changed);

        host.on_client_action(ClientMessage::Flag { row, col }, T0).unwrap();
        let opened = host.on_client_action(ClientMessage::Reveal { row, col }, T0).unwrap();
        assert!(opened.changed);
        assert!(opened.snapshot.cell(row, col).unwrap().is_revealed);
    }

    #[test]
    fn out_of_range_move_is_an_error() {
        let mut host = host();

        let err = host
            .on_client_action(ClientMessage::Reveal { row: 10, col: 0 }, T0)
            .unwrap_err();

        assert!(matches!(err, HostError::Game(GameError::InvalidCoords)));
    }

    #[test]
    fn tick_reports_only_the_expiring_tick() {
        let mut host = host();

        assert_eq!(host.on_tick(T0 + 119_000), None);

        let expired = host.on_tick(T0 + 120_000).unwrap();
        assert_eq!(expired.status, MatchStatus::Lost);
        assert_eq!(expired.end_time, Some(T0 + 120_000));
        assert!(expired
            .grid
            .iter()
            .flatten()
            .filter(|cell| cell.is_mine)
            .all(|cell| cell.is_revealed));

        assert_eq!(host.on_tick(T0 + 121_000), None);
    }

    #[test]
    fn concealed_host_hides_mines() {
        let host = GameHost::new(BoardConfig::DEFAULT, 5, SnapshotMode::Concealed, T0);

        assert!(host.snapshot().grid.iter().flatten().all(|cell| !cell.is_mine));
        assert_eq!(host.snapshot().mines, 15);
    }
}
