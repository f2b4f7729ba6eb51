//! A low-level blocking TCP client.
//!
//! This client is blocking and so is primarily used as a testing utility
//! and reference implementation of the client side of the protocol.

use anyhow::{bail, Error};
use std::{
    net::{Shutdown, SocketAddr, TcpStream},
    sync::mpsc,
    thread,
    time::Duration,
};

use super::{
    messages::{ClientMessage, ServerMessage},
    utils,
};
use crate::game::entities::Player;

/// Default timeout for reading from a service.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for writing to a service.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// A blocking TCP client session with the lobby service.
///
/// The usual flow is [`Client::login`] against the authentication port,
/// then [`Client::join`] with the authenticated identity against the
/// game port.
#[derive(Debug)]
pub struct Client {
    /// The identity this session joined with.
    pub player: Player,
    stream: TcpStream,
}

impl Client {
    /// Authenticate against the authentication service. The connection
    /// is a single request/response exchange and is closed afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, on an `AuthFailure`
    /// response (bad credentials, lockout), or on a protocol violation.
    pub fn login(addr: &SocketAddr, username: &str, password: &str) -> Result<Player, Error> {
        let mut stream = connect_with_backoff(addr)?;
        let request = ClientMessage::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        utils::write_prefixed(&mut stream, &request)?;
        let response = utils::read_prefixed::<ServerMessage, TcpStream>(&mut stream);
        let _ = stream.shutdown(Shutdown::Both);
        match response? {
            ServerMessage::AuthSuccess(player) => Ok(player),
            ServerMessage::AuthFailure(reason) => bail!("authentication failed: {reason}"),
            response => bail!("invalid server response: {response}"),
        }
    }

    /// Join the lobby with an authenticated identity and consume the
    /// initial lobby-size broadcast.
    ///
    /// # Errors
    ///
    /// Returns an error if unable to connect or if the lobby rejects the
    /// join (duplicate identity, full lobby, round in progress).
    pub fn join(player: Player, addr: &SocketAddr) -> Result<(Self, usize), Error> {
        let mut stream = connect_with_backoff(addr)?;
        utils::write_prefixed(&mut stream, &ClientMessage::Join(player.clone()))?;
        match utils::read_prefixed::<ServerMessage, TcpStream>(&mut stream) {
            Ok(ServerMessage::LobbySize(size)) => Ok((Self { player, stream }, size)),
            Ok(ServerMessage::Shutdown) => {
                bail!("join rejected for {}", player.username)
            }
            Ok(response) => bail!("invalid server response: {response}"),
            Err(error) => bail!("join failed for {}: {error}", player.username),
        }
    }

    /// Receive the next broadcast from the lobby.
    pub fn recv(&mut self) -> Result<ServerMessage, Error> {
        match utils::read_prefixed::<ServerMessage, TcpStream>(&mut self.stream) {
            Ok(ServerMessage::AuthFailure(reason)) => bail!(reason),
            Ok(msg) => Ok(msg),
            Err(error) => bail!(error),
        }
    }

    pub fn start_game(&mut self) -> Result<(), Error> {
        utils::write_prefixed(&mut self.stream, &ClientMessage::StartGame)?;
        Ok(())
    }

    pub fn rematch(&mut self) -> Result<(), Error> {
        utils::write_prefixed(&mut self.stream, &ClientMessage::Rematch)?;
        Ok(())
    }

    /// Open a background listener that forwards lobby broadcasts over a
    /// channel until it sees `Shutdown`, the channel is dropped, or the
    /// connection dies. Don't mix with [`Client::recv`] on the same
    /// session; the two would race for incoming messages.
    pub fn listen(
        &self,
    ) -> Result<(mpsc::Receiver<ServerMessage>, thread::JoinHandle<()>), Error> {
        let mut stream = self.stream.try_clone()?;
        // Broadcasts can be arbitrarily far apart; the listener waits
        // indefinitely rather than inheriting the request timeout.
        stream.set_read_timeout(None)?;
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || loop {
            match utils::read_prefixed::<ServerMessage, TcpStream>(&mut stream) {
                Ok(ServerMessage::Shutdown) | Err(_) => return,
                Ok(message) => {
                    if tx.send(message).is_err() {
                        return;
                    }
                }
            }
        });
        Ok((rx, handle))
    }

    /// Disconnect both stream directions. Consumes the session so no
    /// stale handle to the closed stream can be reused.
    pub fn disconnect(mut self) {
        let _ = utils::write_prefixed(&mut self.stream, &ClientMessage::Shutdown);
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

fn connect_with_backoff(addr: &SocketAddr) -> Result<TcpStream, Error> {
    let mut connect_timeouts = vec![
        Duration::from_secs(1),
        Duration::from_millis(500),
        Duration::from_millis(100),
    ];
    while let Some(connect_timeout) = connect_timeouts.pop() {
        match TcpStream::connect_timeout(addr, connect_timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(READ_TIMEOUT))?;
                stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                return Ok(stream);
            }
            _ => thread::sleep(connect_timeout),
        }
    }
    bail!("couldn't connect to {addr}")
}
