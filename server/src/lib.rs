//! Authoritative host for one shared minesweeper match.
//!
//! Clients connect over WebSocket at `/ws`, receive the full match state on connect and after every change, and send
//! reveal, flag, and reset actions back. `/state` serves the current snapshot as plain JSON.

pub use config::*;
pub use host::*;
pub use server::*;

pub mod clock;
mod config;
mod host;
mod server;
