//! The Trenta game server.
//!
//! Runs the lobby service and the authentication service side by side,
//! sharing one player store through an explicitly constructed context.

mod config;

use std::sync::Arc;

use anyhow::{anyhow, Error};
use config::ServerConfig;
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use trenta::{
    auth::AuthService,
    lobby::LobbyServer,
    store::{MemoryPlayerStore, PlayerStore},
    Player,
};

const HELP: &str = "\
Run a Trenta card game server

USAGE:
  trenta_server [OPTIONS]

OPTIONS:
  --game-bind  IP:PORT     Lobby service bind address  [default: env GAME_BIND or 127.0.0.1:7878]
  --auth-bind  IP:PORT     Auth service bind address   [default: env AUTH_BIND or 127.0.0.1:7879]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  GAME_BIND                Lobby service bind address
  AUTH_BIND                Auth service bind address
  LOBBY_CAPACITY           Seats per round                  [default: 4]
  ROUND_BET                Points wagered per comparison    [default: 10]
  HAND_SIZE                Cards dealt per player           [default: 3]
  COUNTDOWN_TIMEOUT_SECS   Countdown before backfilling     [default: 30]
  COUNTDOWN_POLL_MS        Countdown poll interval          [default: 1000]
  LOCKOUT_MAX_ATTEMPTS     Failures before lockout          [default: 3]
  LOCKOUT_SECS             Lockout duration                 [default: 300]
  AUTH_WORKERS             Auth worker pool size            [default: 8]
  ADMIN_PASSWORD           Password for the seeded admin account
";

/// Everything the services share, constructed once in `main` and passed
/// down explicitly.
struct ServerContext {
    config: ServerConfig,
    store: Arc<dyn PlayerStore>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists.
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let game_bind = pargs.opt_value_from_str("--game-bind")?;
    let auth_bind = pargs.opt_value_from_str("--auth-bind")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(game_bind, auth_bind)?;
    config.validate()?;

    let store: Arc<dyn PlayerStore> = Arc::new(MemoryPlayerStore::new());
    let context = ServerContext { config, store };
    seed_admin(&context).await?;

    run(context).await
}

/// Register the built-in admin account so there is always one identity
/// that can authenticate against a fresh store.
async fn seed_admin(context: &ServerContext) -> Result<(), Error> {
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        warn!("ADMIN_PASSWORD not set; using the default admin password");
        "admin".to_string()
    });
    let mut admin = Player::new("admin");
    admin.is_admin = true;
    admin.password_hash = MemoryPlayerStore::hash_password(&password)
        .map_err(|error| anyhow!("failed to hash the admin password: {error}"))?;
    context
        .store
        .add(admin)
        .await
        .map_err(|error| anyhow!("failed to seed the admin account: {error}"))?;
    info!("seeded the admin account");
    Ok(())
}

async fn run(context: ServerContext) -> Result<(), Error> {
    let ServerContext { config, store } = context;

    let lobby = LobbyServer::bind(config.game_bind, config.lobby, Arc::clone(&store))
        .await
        .map_err(|error| anyhow!("failed to start the lobby on {}: {error}", config.game_bind))?;
    let auth = AuthService::bind(
        config.auth_bind,
        store,
        config.lockout,
        config.auth_workers,
    )
    .await
    .map_err(|error| {
        anyhow!(
            "failed to start the auth service on {}: {error}",
            config.auth_bind
        )
    })?;

    info!(
        "server ready: lobby at {}, auth at {} ({} seats, bet {})",
        lobby.local_addr()?,
        auth.local_addr()?,
        config.lobby.capacity,
        config.lobby.bet
    );

    tokio::join!(lobby.run(), auth.run());
    Ok(())
}
