//! In-memory player store.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicI64, Ordering},
};
use tokio::sync::RwLock;

use super::{PlayerStore, StoreError, StoreResult};
use crate::game::entities::Player;

/// A map-backed [`PlayerStore`] with Argon2id password hashing.
pub struct MemoryPlayerStore {
    players: RwLock<HashMap<i64, Player>>,
    next_id: AtomicI64,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Hash a plaintext password for storage.
    pub fn hash_password(plain: &str) -> StoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| StoreError::HashingFailed)
    }
}

impl Default for MemoryPlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerStore for MemoryPlayerStore {
    async fn find_by_username(&self, username: &str) -> Option<Player> {
        let players = self.players.read().await;
        players.values().find(|p| p.username == username).cloned()
    }

    async fn find_by_id(&self, id: i64) -> Option<Player> {
        let players = self.players.read().await;
        players.get(&id).cloned()
    }

    async fn add(&self, mut player: Player) -> StoreResult<Player> {
        let mut players = self.players.write().await;
        if players.values().any(|p| p.username == player.username) {
            return Err(StoreError::UsernameTaken(player.username));
        }
        player.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        players.insert(player.id, player.clone());
        Ok(player)
    }

    async fn list_all(&self) -> Vec<Player> {
        let players = self.players.read().await;
        players.values().cloned().collect()
    }

    async fn verify_password(&self, plain: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    async fn update_points(&self, id: i64, points: i32) -> StoreResult<()> {
        let mut players = self.players.write().await;
        let player = players.get_mut(&id).ok_or(StoreError::PlayerNotFound(id))?;
        player.points = points;
        Ok(())
    }

    async fn update_profile(&self, player: &Player) -> StoreResult<()> {
        let mut players = self.players.write().await;
        let stored = players
            .get_mut(&player.id)
            .ok_or(StoreError::PlayerNotFound(player.id))?;
        stored.username = player.username.clone();
        stored.password_hash = player.password_hash.clone();
        stored.first_name = player.first_name.clone();
        stored.last_name = player.last_name.clone();
        stored.date_of_birth = player.date_of_birth;
        stored.is_admin = player.is_admin;
        Ok(())
    }
}
