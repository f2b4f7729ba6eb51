//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration for both services.

use std::{net::SocketAddr, time::Duration};
use trenta::{auth::LockoutPolicy, lobby::LobbyConfig};

/// Complete server configuration loaded from environment variables.
#[derive(Clone, Copy, Debug)]
pub struct ServerConfig {
    /// Game/lobby service bind address.
    pub game_bind: SocketAddr,
    /// Authentication service bind address.
    pub auth_bind: SocketAddr,
    /// Lobby configuration (capacity, bet, countdown).
    pub lobby: LobbyConfig,
    /// Authentication lockout policy.
    pub lockout: LockoutPolicy,
    /// Authentication worker pool size.
    pub auth_workers: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables, with optional CLI
    /// overrides for the bind addresses.
    pub fn from_env(
        game_bind_override: Option<SocketAddr>,
        auth_bind_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        let game_bind = resolve_bind(game_bind_override, "GAME_BIND", "127.0.0.1:7878")?;
        let auth_bind = resolve_bind(auth_bind_override, "AUTH_BIND", "127.0.0.1:7879")?;

        let defaults = LobbyConfig::default();
        let lobby = LobbyConfig {
            capacity: parse_env_or("LOBBY_CAPACITY", defaults.capacity),
            bet: parse_env_or("ROUND_BET", defaults.bet),
            hand_size: parse_env_or("HAND_SIZE", defaults.hand_size),
            countdown_timeout: Duration::from_secs(parse_env_or("COUNTDOWN_TIMEOUT_SECS", 30)),
            poll_interval: Duration::from_millis(parse_env_or("COUNTDOWN_POLL_MS", 1000)),
        };

        let lockout = LockoutPolicy::new(
            parse_env_or("LOCKOUT_MAX_ATTEMPTS", 3),
            Duration::from_secs(parse_env_or("LOCKOUT_SECS", 300)),
        );

        Ok(Self {
            game_bind,
            auth_bind,
            lobby,
            lockout,
            auth_workers: parse_env_or("AUTH_WORKERS", 8),
        })
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game_bind == self.auth_bind {
            return Err(ConfigError::Invalid {
                var: "AUTH_BIND".to_string(),
                reason: "must differ from the game bind address".to_string(),
            });
        }
        self.lobby.validate().map_err(|error| ConfigError::Invalid {
            var: "LOBBY_CAPACITY".to_string(),
            reason: error.to_string(),
        })?;
        if self.lockout.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "LOCKOUT_MAX_ATTEMPTS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.auth_workers == 0 {
            return Err(ConfigError::Invalid {
                var: "AUTH_WORKERS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn resolve_bind(
    cli_override: Option<SocketAddr>,
    var: &str,
    default: &str,
) -> Result<SocketAddr, ConfigError> {
    if let Some(addr) = cli_override {
        return Ok(addr);
    }
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("{raw} is not a socket address"),
        }),
        Err(_) => Ok(default.parse().expect("default bind address is valid")),
    }
}

/// Parse an environment variable with a default fallback.
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
