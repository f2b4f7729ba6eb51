//! Player-record store collaborator.
//!
//! Durable player storage is outside this crate's remit; the services
//! only ever talk to the [`PlayerStore`] trait, which keeps them
//! testable and lets deployments swap the backing store without touching
//! game code. [`MemoryPlayerStore`] is the bundled implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::game::entities::Player;

pub mod memory;

pub use memory::MemoryPlayerStore;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum StoreError {
    #[error("player {0} does not exist")]
    PlayerNotFound(i64),
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("password hashing failed")]
    HashingFailed,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the coordination layer needs from the player store.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Option<Player>;

    async fn find_by_id(&self, id: i64) -> Option<Player>;

    /// Register a new player, assigning its id. The username must be
    /// unique.
    async fn add(&self, player: Player) -> StoreResult<Player>;

    async fn list_all(&self) -> Vec<Player>;

    /// Check a plaintext password against a stored hash. The hash scheme
    /// is the store's business; callers treat it as opaque.
    async fn verify_password(&self, plain: &str, hash: &str) -> bool;

    async fn update_points(&self, id: i64, points: i32) -> StoreResult<()>;

    /// Overwrite the stored profile and credentials for an existing
    /// player. Points and the ephemeral hand are untouched.
    async fn update_profile(&self, player: &Player) -> StoreResult<()>;
}
