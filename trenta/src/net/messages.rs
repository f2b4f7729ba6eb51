use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::entities::{Card, Player};

/// A message from a client to the lobby or authentication service.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum ClientMessage {
    /// An authenticated player wants a lobby seat.
    Join(Player),
    /// Credentials for the authentication service.
    Login { username: String, password: String },
    /// Ask the lobby to start the round countdown.
    StartGame,
    /// Ask the lobby to run another round with the current roster.
    Rematch,
    /// Graceful instruction for the receiver to stop reading and close.
    Shutdown,
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Join(player) => &format!("{} requested a seat", player.username),
            Self::Login { username, .. } => &format!("login attempt for {username}"),
            Self::StartGame => "requested a game start",
            Self::Rematch => "requested a rematch",
            Self::Shutdown => "shutdown",
        };
        write!(f, "{repr}")
    }
}

/// A message from a service to its clients.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum ServerMessage {
    /// Current number of seated players, broadcast on every join.
    LobbySize(usize),
    /// Dealt hands in roster order.
    Hands(Vec<(String, Vec<Card>)>),
    /// The roster with settled point totals.
    PointsUpdated(Vec<Player>),
    /// The round's winning players.
    Winners(Vec<Player>),
    /// Authentication accepted; carries the stored player.
    AuthSuccess(Player),
    /// Authentication refused, with a human-readable reason.
    AuthFailure(String),
    /// Graceful instruction for the receiver to stop reading and close.
    Shutdown,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::LobbySize(size) => &format!("lobby has {size} player(s)"),
            Self::Hands(hands) => &format!("dealt {} hand(s)", hands.len()),
            Self::PointsUpdated(roster) => &format!("points updated for {} player(s)", roster.len()),
            Self::Winners(winners) => &format!(
                "winners: {}",
                winners
                    .iter()
                    .map(|p| p.username.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::AuthSuccess(player) => &format!("{} authenticated", player.username),
            Self::AuthFailure(reason) => reason,
            Self::Shutdown => "shutdown",
        };
        write!(f, "{repr}")
    }
}
