//! # Trenta
//!
//! A multiplayer card game engine built around a simple betting game:
//! every player is dealt a fixed-size hand, the hand's rank values are
//! summed, the designated main player settles a fixed bet against every
//! opponent, and the highest hand wins the round (ties broken by card
//! precedence, King high down to Ace low).
//!
//! The crate provides the full coordination layer for remote play:
//!
//! - [`game`]: cards, decks, the scoring engine, and the round orchestrator
//! - [`lobby`]: the session manager — connection acceptance, roster
//!   bookkeeping, countdown-driven round starts, and seat backfilling
//! - [`auth`]: a standalone authentication service with per-address
//!   failed-attempt lockout
//! - [`net`]: the length-prefixed binary message protocol and a blocking
//!   reference client
//! - [`store`]: the player-record collaborator trait plus an in-memory
//!   implementation
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use trenta::{
//!     lobby::{LobbyConfig, LobbyServer},
//!     store::MemoryPlayerStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let store = Arc::new(MemoryPlayerStore::new());
//!     let lobby = LobbyServer::bind(
//!         "127.0.0.1:7878".parse().unwrap(),
//!         LobbyConfig::default(),
//!         store,
//!     )
//!     .await?;
//!     lobby.run().await;
//!     Ok(())
//! }
//! ```

/// Authentication service with brute-force lockout.
pub mod auth;

/// Core game logic: entities, scoring, and round orchestration.
pub mod game;

/// Lobby/session manager for the game service.
pub mod lobby;

/// Networking components: message protocol, framing, and client.
pub mod net;

/// Player-record store collaborator.
pub mod store;

pub use game::{
    entities::{self, Card, Deck, Player, Rank, Suit, DEFAULT_HAND_SIZE, DEFAULT_STARTING_POINTS},
    round, scoring,
};
pub use net::{client::Client, messages};
