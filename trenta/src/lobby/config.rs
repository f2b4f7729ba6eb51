//! Lobby configuration.

use std::time::Duration;
use thiserror::Error;

use crate::game::{entities::DEFAULT_HAND_SIZE, round::MIN_ROUND_PLAYERS};

/// Fixed configuration for one lobby.
#[derive(Clone, Copy, Debug)]
pub struct LobbyConfig {
    /// Seats filled before (or when) a round begins.
    pub capacity: usize,
    /// Points transferred per pairwise comparison each round.
    pub bet: i32,
    /// Cards dealt to each player.
    pub hand_size: usize,
    /// How long the countdown waits for a full lobby before backfilling.
    pub countdown_timeout: Duration,
    /// How often the countdown re-checks the roster.
    pub poll_interval: Duration,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            bet: 10,
            hand_size: DEFAULT_HAND_SIZE,
            countdown_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum LobbyConfigError {
    #[error("invalid lobby configuration for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl LobbyConfig {
    pub fn validate(&self) -> Result<(), LobbyConfigError> {
        if self.capacity < MIN_ROUND_PLAYERS {
            return Err(LobbyConfigError::Invalid {
                field: "capacity",
                reason: format!("must be at least {MIN_ROUND_PLAYERS}"),
            });
        }
        if self.hand_size == 0 {
            return Err(LobbyConfigError::Invalid {
                field: "hand_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.capacity * self.hand_size > 52 {
            return Err(LobbyConfigError::Invalid {
                field: "capacity",
                reason: format!(
                    "{} players x {} cards exceeds one 52-card deck",
                    self.capacity, self.hand_size
                ),
            });
        }
        if self.bet <= 0 {
            return Err(LobbyConfigError::Invalid {
                field: "bet",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.poll_interval.is_zero() || self.poll_interval > self.countdown_timeout {
            return Err(LobbyConfigError::Invalid {
                field: "poll_interval",
                reason: "must be non-zero and no longer than the countdown timeout".to_string(),
            });
        }
        Ok(())
    }
}
