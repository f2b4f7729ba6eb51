//! The authentication service.

use log::{debug, error, info, warn};
use std::{io, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::Semaphore,
    time::timeout,
};

use super::{
    errors::AuthError,
    lockout::{LockoutPolicy, LockoutTracker},
};
use crate::{
    net::{
        messages::{ClientMessage, ServerMessage},
        utils,
    },
    store::PlayerStore,
};

/// Default size of the request worker pool.
pub const DEFAULT_WORKERS: usize = 8;

/// How long a worker waits for a request envelope before giving up on
/// the connection.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// A standalone login service: accepts connections on its own port and
/// dispatches each request to a bounded worker pool.
pub struct AuthService {
    listener: TcpListener,
    store: Arc<dyn PlayerStore>,
    tracker: Arc<LockoutTracker>,
    workers: Arc<Semaphore>,
}

impl AuthService {
    /// Bind the service. A bind failure is fatal to startup and is
    /// returned to the caller rather than handled here.
    pub async fn bind(
        addr: SocketAddr,
        store: Arc<dyn PlayerStore>,
        policy: LockoutPolicy,
        workers: usize,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "authentication service listening on {}",
            listener.local_addr()?
        );
        Ok(Self {
            listener,
            store,
            tracker: Arc::new(LockoutTracker::new(policy)),
            workers: Arc::new(Semaphore::new(workers.max(1))),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is dropped. Individual request
    /// failures never take the service down.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let store = Arc::clone(&self.store);
                    let tracker = Arc::clone(&self.tracker);
                    let workers = Arc::clone(&self.workers);
                    tokio::spawn(async move {
                        let Ok(_permit) = workers.acquire().await else {
                            return;
                        };
                        if let Err(error) = handle_request(stream, peer, store, tracker).await {
                            warn!("auth connection from {peer} closed: {error}");
                        }
                    });
                }
                Err(error) => error!("auth accept failed: {error}"),
            }
        }
    }
}

async fn handle_request(
    mut stream: TcpStream,
    peer: SocketAddr,
    store: Arc<dyn PlayerStore>,
    tracker: Arc<LockoutTracker>,
) -> io::Result<()> {
    let addr = peer.ip();
    let request = match timeout(
        READ_TIMEOUT,
        utils::read_prefixed_async::<ClientMessage, _>(&mut stream),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            warn!("auth read from {peer} timed out");
            return Ok(());
        }
    };

    // Locked-out addresses get the refusal without their request being
    // processed or counted. The request is still drained above so the
    // close after the response is clean.
    if tracker.is_locked_out(addr).await {
        debug!("refusing locked-out address {addr}");
        return utils::write_prefixed_async(
            &mut stream,
            &ServerMessage::AuthFailure(AuthError::LockedOut.to_string()),
        )
        .await;
    }

    let response = match request {
        ClientMessage::Login { username, password } => {
            login(&username, &password, addr, store.as_ref(), &tracker).await
        }
        other => {
            debug!("unexpected auth request from {peer}: {other}");
            ServerMessage::AuthFailure(AuthError::UnknownRequest.to_string())
        }
    };
    utils::write_prefixed_async(&mut stream, &response).await
}

async fn login(
    username: &str,
    password: &str,
    addr: std::net::IpAddr,
    store: &dyn PlayerStore,
    tracker: &LockoutTracker,
) -> ServerMessage {
    // Blank input is a failed attempt like any other; it still counts
    // toward the lockout.
    if username.trim().is_empty() || password.trim().is_empty() {
        if tracker.record_failure(addr).await {
            warn!("address {addr} locked out after repeated failures");
        }
        return ServerMessage::AuthFailure(AuthError::InvalidInput.to_string());
    }

    let verified = match store.find_by_username(username).await {
        Some(player) => store
            .verify_password(password, &player.password_hash)
            .await
            .then_some(player),
        None => None,
    };

    match verified {
        Some(player) => {
            tracker.clear(addr).await;
            info!("{username} authenticated from {addr}");
            ServerMessage::AuthSuccess(player)
        }
        None => {
            if tracker.record_failure(addr).await {
                warn!("address {addr} locked out after repeated failures");
            }
            debug!("failed login for {username} from {addr}");
            ServerMessage::AuthFailure(AuthError::InvalidCredentials.to_string())
        }
    }
}
