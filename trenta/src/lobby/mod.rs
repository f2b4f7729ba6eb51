//! Lobby/session manager for the game service.
//!
//! Accepts client connections, keeps the roster and its connections
//! paired, runs the start/rematch countdown, backfills missing seats,
//! and broadcasts round results.

mod actor;
pub mod config;

pub use actor::LobbyServer;
pub use config::{LobbyConfig, LobbyConfigError};
