//! JSON messages exchanged between the game server and its clients.
//!
//! Every WebSocket text frame carries exactly one message, tagged by a `type` field.

use sapper_core::Coord;
use serde::{Deserialize, Serialize};

pub use snapshot::*;

mod snapshot;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Reveal {
        row: Coord,
        col: Coord,
    },
    Flag {
        row: Coord,
        col: Coord,
    },
    /// Any missing or zero field selects the default board.
    Reset {
        #[serde(default)]
        rows: Option<Coord>,
        #[serde(default)]
        cols: Option<Coord>,
        #[serde(default)]
        mines: Option<u16>,
    },
}

impl ClientMessage {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    State {
        #[serde(rename = "match")]
        snapshot: MatchSnapshot,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<MatchSnapshot> for ServerMessage {
    fn from(snapshot: MatchSnapshot) -> Self {
        Self::State { snapshot }
    }
}
