//! The lobby actor.
//!
//! All roster and connection state is owned by a single actor task; the
//! accept loop, per-client reader tasks, and countdown tasks only ever
//! talk to it through its inbox. That serializes every mutation and
//! broadcast, so a reader can never observe a torn (player, connection)
//! pairing and two broadcasts can never interleave partial writes.

use log::{debug, error, info, warn};
use rand::{rng, seq::SliceRandom};
use std::{io, net::SocketAddr, sync::Arc};
use tokio::{
    io::AsyncWriteExt,
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
    sync::mpsc,
    time::{sleep, Instant},
};

use super::config::LobbyConfig;
use crate::{
    game::{
        entities::Player,
        round::{Round, RoundOutcome},
    },
    net::{
        messages::{ClientMessage, ServerMessage},
        utils,
    },
    store::{PlayerStore, StoreError},
};

/// Messages processed by the lobby actor.
enum LobbyMessage {
    /// A connection completed its join handshake in the accept loop.
    Join { player: Player, stream: TcpStream },
    /// A reader task saw a disconnect, error, or shutdown request.
    Leave { username: String },
    /// A seated client asked for a round (start or rematch).
    StartRequested { username: String },
    /// Periodic countdown check: begin early if the lobby is full.
    CountdownPoll { generation: u64 },
    /// The countdown ran out: backfill and begin.
    CountdownElapsed { generation: u64 },
}

/// One admitted client. The seated player and its outbound connection
/// are owned as a single value so the pairing cannot drift.
struct Seat {
    player: Player,
    writer: OwnedWriteHalf,
}

/// The lobby service: an accept loop plus the state-owning actor.
pub struct LobbyServer {
    listener: TcpListener,
    actor: LobbyActor,
    sender: mpsc::Sender<LobbyMessage>,
}

impl LobbyServer {
    /// Bind the game port. Configuration and bind failures are fatal to
    /// startup.
    pub async fn bind(
        addr: SocketAddr,
        config: LobbyConfig,
        store: Arc<dyn PlayerStore>,
    ) -> io::Result<Self> {
        config
            .validate()
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
        let listener = TcpListener::bind(addr).await?;
        info!("lobby listening on {}", listener.local_addr()?);
        let (sender, inbox) = mpsc::channel(64);
        let actor = LobbyActor {
            config,
            store,
            seats: Vec::with_capacity(config.capacity),
            inbox,
            sender: sender.clone(),
            countdown_running: false,
            generation: 0,
        };
        Ok(Self {
            listener,
            actor,
            sender,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the accept loop and the actor until the actor stops.
    pub async fn run(self) {
        let Self {
            listener,
            actor,
            sender,
        } = self;
        let accept = tokio::spawn(accept_loop(listener, sender));
        actor.run().await;
        accept.abort();
    }
}

/// Accept connections and perform the join handshake: exactly one
/// `Join` envelope opens a session. Everything else is handed to the
/// actor, which decides whether the seat is granted.
async fn accept_loop(listener: TcpListener, sender: mpsc::Sender<LobbyMessage>) {
    loop {
        match listener.accept().await {
            Ok((mut stream, peer)) => {
                match utils::read_prefixed_async::<ClientMessage, _>(&mut stream).await {
                    Ok(ClientMessage::Join(player)) => {
                        if sender
                            .send(LobbyMessage::Join { player, stream })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Ok(other) => warn!("expected a join from {peer}, got: {other}"),
                    Err(error) => warn!("failed to read join from {peer}: {error}"),
                }
            }
            Err(error) => error!("lobby accept failed: {error}"),
        }
    }
}

/// Dedicated read loop for one seated client.
async fn reader_loop(
    mut reader: OwnedReadHalf,
    username: String,
    sender: mpsc::Sender<LobbyMessage>,
) {
    loop {
        match utils::read_prefixed_async::<ClientMessage, _>(&mut reader).await {
            Ok(ClientMessage::StartGame | ClientMessage::Rematch) => {
                if sender
                    .send(LobbyMessage::StartRequested {
                        username: username.clone(),
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Ok(ClientMessage::Shutdown) => {
                let _ = sender.send(LobbyMessage::Leave { username }).await;
                return;
            }
            Ok(other) => debug!("{username} sent an unexpected message: {other}"),
            Err(error) => {
                debug!("{username} disconnected: {error}");
                let _ = sender.send(LobbyMessage::Leave { username }).await;
                return;
            }
        }
    }
}

/// Countdown task: poll until the deadline, then report expiry. The
/// actor ignores messages from superseded generations, so a stale
/// countdown can never start a second round.
async fn countdown(
    sender: mpsc::Sender<LobbyMessage>,
    generation: u64,
    config: LobbyConfig,
) {
    let deadline = Instant::now() + config.countdown_timeout;
    loop {
        sleep(config.poll_interval).await;
        if Instant::now() >= deadline {
            let _ = sender.send(LobbyMessage::CountdownElapsed { generation }).await;
            return;
        }
        if sender
            .send(LobbyMessage::CountdownPoll { generation })
            .await
            .is_err()
        {
            return;
        }
    }
}

struct LobbyActor {
    config: LobbyConfig,
    store: Arc<dyn PlayerStore>,
    seats: Vec<Seat>,
    inbox: mpsc::Receiver<LobbyMessage>,
    sender: mpsc::Sender<LobbyMessage>,
    countdown_running: bool,
    /// Bumped when a round begins; countdown messages from earlier
    /// generations are ignored.
    generation: u64,
}

impl LobbyActor {
    async fn run(mut self) {
        while let Some(message) = self.inbox.recv().await {
            match message {
                LobbyMessage::Join { player, stream } => self.handle_join(player, stream).await,
                LobbyMessage::Leave { username } => self.handle_leave(&username).await,
                LobbyMessage::StartRequested { username } => self.handle_start(&username),
                LobbyMessage::CountdownPoll { generation } => {
                    if generation == self.generation && self.seats.len() >= self.config.capacity {
                        self.begin_round().await;
                    }
                }
                LobbyMessage::CountdownElapsed { generation } => {
                    if generation == self.generation {
                        self.begin_round().await;
                    }
                }
            }
        }
    }

    async fn handle_join(&mut self, player: Player, stream: TcpStream) {
        if self.seats.len() >= self.config.capacity {
            warn!("rejecting {}: lobby full", player.username);
            reject(stream).await;
            return;
        }
        if self.seats.iter().any(|seat| seat.player == player) {
            warn!("rejecting {}: already seated", player.username);
            reject(stream).await;
            return;
        }

        let (reader, writer) = stream.into_split();
        info!(
            "{} joined the lobby ({}/{})",
            player.username,
            self.seats.len() + 1,
            self.config.capacity
        );
        tokio::spawn(reader_loop(
            reader,
            player.username.clone(),
            self.sender.clone(),
        ));
        self.seats.push(Seat { player, writer });
        let size = self.seats.len();
        self.broadcast(&ServerMessage::LobbySize(size)).await;
    }

    async fn handle_leave(&mut self, username: &str) {
        let Some(position) = self
            .seats
            .iter()
            .position(|seat| seat.player.username == username)
        else {
            return;
        };
        let mut seat = self.seats.remove(position);
        let _ = seat.writer.shutdown().await;
        info!("{username} left the lobby ({} seated)", self.seats.len());
    }

    /// Start or rematch request. Spawning the countdown is idempotent: a
    /// second trigger while one is pending is a no-op.
    fn handle_start(&mut self, username: &str) {
        if self.countdown_running {
            debug!("start request from {username} ignored: round already pending");
            return;
        }
        info!("{username} requested a round; countdown started");
        self.countdown_running = true;
        tokio::spawn(countdown(self.sender.clone(), self.generation, self.config));
    }

    /// Assemble, run, and broadcast one round. The actor processes one
    /// message at a time, so this whole sequence is the mutual-exclusion
    /// section: a second trigger cannot begin a round while this one is
    /// running.
    async fn begin_round(&mut self) {
        // Bumping the generation makes the remaining countdown messages
        // for the old one inert.
        self.generation += 1;
        self.countdown_running = false;

        let roster = match self.assemble_roster().await {
            Ok(roster) => roster,
            Err(error) => {
                error!("could not assemble a roster: {error}");
                return;
            }
        };
        info!("beginning a round with {} players", roster.len());
        match Round::new(roster, self.config.hand_size, self.config.bet)
            .run(self.store.as_ref())
            .await
        {
            Ok(outcome) => self.broadcast_outcome(outcome).await,
            Err(error) => error!("round aborted: {error}"),
        }
    }

    /// The round roster: every seated player, backfilled to capacity
    /// with unseated stored players and freshly registered bots.
    async fn assemble_roster(&self) -> Result<Vec<Player>, StoreError> {
        let mut roster: Vec<Player> = self.seats.iter().map(|seat| seat.player.clone()).collect();
        backfill(self.store.as_ref(), &mut roster, self.config.capacity).await?;
        Ok(roster)
    }

    async fn broadcast_outcome(&mut self, outcome: RoundOutcome) {
        // Refresh seated players from the settled roster so a rematch
        // settles from current totals.
        for seat in &mut self.seats {
            if let Some(updated) = outcome.roster.iter().find(|p| **p == seat.player) {
                seat.player.points = updated.points;
            }
        }
        info!("round finished; {}", ServerMessage::Winners(outcome.winners.clone()));
        self.broadcast(&ServerMessage::Hands(outcome.hands)).await;
        self.broadcast(&ServerMessage::PointsUpdated(outcome.roster))
            .await;
        self.broadcast(&ServerMessage::Winners(outcome.winners))
            .await;
    }

    /// Write a message to every seated client, dropping seats whose
    /// connections have died. Runs on the actor, so broadcasts are
    /// naturally serialized.
    async fn broadcast(&mut self, message: &ServerMessage) {
        let mut index = 0;
        while index < self.seats.len() {
            match utils::write_prefixed_async(&mut self.seats[index].writer, message).await {
                Ok(()) => index += 1,
                Err(error) => {
                    let seat = self.seats.remove(index);
                    warn!("dropping {}: {error}", seat.player.username);
                }
            }
        }
    }
}

/// Rejected connections get the graceful stop envelope before the close
/// so a well-behaved client can tell rejection from a network fault.
async fn reject(mut stream: TcpStream) {
    let _ = utils::write_prefixed_async(&mut stream, &ServerMessage::Shutdown).await;
}

/// Fill `roster` up to `capacity`: unseated stored players first, in
/// shuffled order, then synthesized bot players registered through the
/// store so they have ids.
async fn backfill(
    store: &dyn PlayerStore,
    roster: &mut Vec<Player>,
    capacity: usize,
) -> Result<(), StoreError> {
    let shortfall = capacity.saturating_sub(roster.len());
    if shortfall == 0 {
        return Ok(());
    }

    let mut candidates: Vec<Player> = store
        .list_all()
        .await
        .into_iter()
        .filter(|player| !roster.contains(player))
        .collect();
    candidates.shuffle(&mut rng());
    candidates.truncate(shortfall);
    if !candidates.is_empty() {
        info!("seating {} stored player(s) as fillers", candidates.len());
    }
    roster.extend(candidates);

    let mut bot_index = 1;
    while roster.len() < capacity {
        let bot = register_bot(store, bot_index).await?;
        info!("seating synthesized player {}", bot.username);
        roster.push(bot);
        bot_index += 1;
    }
    Ok(())
}

/// Register a bot player under a free username: `Bot{index}`, then
/// `Bot{index}_1`, `Bot{index}_2`, … until no collision remains.
async fn register_bot(store: &dyn PlayerStore, index: usize) -> Result<Player, StoreError> {
    let base = format!("Bot{index}");
    let mut username = base.clone();
    let mut suffix = 1;
    while store.find_by_username(&username).await.is_some() {
        username = format!("{base}_{suffix}");
        suffix += 1;
    }
    store.add(Player::new(&username)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPlayerStore;

    #[tokio::test]
    async fn backfill_prefers_stored_players_over_bots() {
        let store = MemoryPlayerStore::new();
        let seated = store.add(Player::new("alice")).await.unwrap();
        let bench = store.add(Player::new("bench")).await.unwrap();

        let mut roster = vec![seated, store.add(Player::new("bob")).await.unwrap()];
        backfill(&store, &mut roster, 4).await.unwrap();

        assert_eq!(roster.len(), 4);
        assert!(roster.iter().any(|p| p.username == bench.username));
        // Exactly one synthesized seat remains.
        let bots: Vec<&Player> = roster
            .iter()
            .filter(|p| p.username.starts_with("Bot"))
            .collect();
        assert_eq!(bots.len(), 1);
    }

    #[tokio::test]
    async fn backfill_produces_no_duplicate_usernames() {
        let store = MemoryPlayerStore::new();
        let mut roster = vec![store.add(Player::new("alice")).await.unwrap()];
        backfill(&store, &mut roster, 5).await.unwrap();

        assert_eq!(roster.len(), 5);
        let mut names: Vec<&str> = roster.iter().map(|p| p.username.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[tokio::test]
    async fn backfill_at_capacity_is_a_no_op() {
        let store = MemoryPlayerStore::new();
        store.add(Player::new("bench")).await.unwrap();
        let mut roster = vec![Player::new("a"), Player::new("b"), Player::new("c")];
        backfill(&store, &mut roster, 3).await.unwrap();
        assert_eq!(roster.len(), 3);
    }

    #[tokio::test]
    async fn bot_usernames_are_suffixed_around_collisions() {
        let store = MemoryPlayerStore::new();
        store.add(Player::new("Bot1")).await.unwrap();
        store.add(Player::new("Bot1_1")).await.unwrap();

        let bot = register_bot(&store, 1).await.unwrap();
        assert_eq!(bot.username, "Bot1_2");
        assert!(bot.id > 0);
    }

    #[tokio::test]
    async fn backfilled_bots_are_registered_with_the_store() {
        let store = MemoryPlayerStore::new();
        let mut roster = vec![store.add(Player::new("alice")).await.unwrap()];
        backfill(&store, &mut roster, 3).await.unwrap();

        for player in &roster {
            let stored = store.find_by_username(&player.username).await;
            assert!(stored.is_some(), "{} not registered", player.username);
            assert!(stored.unwrap().id > 0);
        }
    }
}
