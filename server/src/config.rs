use std::net::SocketAddr;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use sapper_core::{BoardConfig, CellCount, Coord};
use sapper_protocol::SnapshotMode;

#[derive(Parser, Debug)]
#[command(version, about = "Shared-board minesweeper server", long_about = None)]
pub struct Args {
    /// What log level to use
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Force a seed instead of random, each reset moves on to the next seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Rows of the first board
    #[arg(long, default_value_t = BoardConfig::DEFAULT.size.0)]
    pub rows: Coord,

    /// Columns of the first board
    #[arg(long, default_value_t = BoardConfig::DEFAULT.size.1)]
    pub cols: Coord,

    /// Mines on the first board
    #[arg(long, default_value_t = BoardConfig::DEFAULT.mines)]
    pub mines: CellCount,

    /// Keep mine positions out of snapshots until the match ends
    #[arg(long)]
    pub conceal_mines: bool,
}

impl Args {
    pub fn board_config(&self) -> sapper_core::Result<BoardConfig> {
        BoardConfig::new((self.rows, self.cols), self.mines)
    }

    pub fn snapshot_mode(&self) -> SnapshotMode {
        if self.conceal_mines {
            SnapshotMode::Concealed
        } else {
            SnapshotMode::Full
        }
    }
}
