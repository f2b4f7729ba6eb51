//! Round orchestration.
//!
//! A [`Round`] owns one complete deal → settle → report cycle for a
//! roster. It exists only for the duration of that cycle: the lobby
//! constructs it when a start trigger fires and the outcome consumes it.

use log::warn;
use thiserror::Error;

use super::{
    entities::{Card, Deck, Player},
    scoring,
};
use crate::store::PlayerStore;

/// Fewest players a round can be dealt to.
pub const MIN_ROUND_PLAYERS: usize = 3;

/// Round lifecycle. Transitions only move forward; calling an operation
/// out of order is a programming error surfaced as [`RoundError::OutOfPhase`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundPhase {
    Idle,
    Dealt,
    Settled,
    Reported,
}

#[derive(Debug, Error)]
pub enum RoundError {
    #[error("cannot deal to {actual} players, need at least {MIN_ROUND_PLAYERS}")]
    NotEnoughPlayers { actual: usize },
    #[error("deck exhausted while dealing")]
    DeckExhausted,
    #[error("{op} is not valid in the {phase:?} phase")]
    OutOfPhase { op: &'static str, phase: RoundPhase },
}

/// Everything the lobby needs to broadcast once a round completes.
#[derive(Clone, Debug)]
pub struct RoundOutcome {
    /// Dealt hands in roster order.
    pub hands: Vec<(String, Vec<Card>)>,
    /// The roster with settled point totals.
    pub roster: Vec<Player>,
    /// The winning players (more than one on a split).
    pub winners: Vec<Player>,
}

pub struct Round {
    roster: Vec<Player>,
    deck: Deck,
    hand_size: usize,
    bet: i32,
    phase: RoundPhase,
}

impl Round {
    /// A fresh round over the given roster. Stale hands from earlier
    /// rounds are cleared here so every round deals from scratch.
    pub fn new(roster: Vec<Player>, hand_size: usize, bet: i32) -> Self {
        let roster = roster
            .into_iter()
            .map(|mut player| {
                player.hand.clear();
                player
            })
            .collect();
        Self {
            roster,
            deck: Deck::default(),
            hand_size,
            bet,
            phase: RoundPhase::Idle,
        }
    }

    /// Shuffle a fresh deck and deal every roster player a full hand,
    /// round-robin: one card per player per pass. A short roster aborts
    /// before any card moves.
    pub fn deal(&mut self) -> Result<(), RoundError> {
        self.expect_phase(RoundPhase::Idle, "deal")?;
        if self.roster.len() < MIN_ROUND_PLAYERS {
            return Err(RoundError::NotEnoughPlayers {
                actual: self.roster.len(),
            });
        }
        self.deck.shuffle();
        deal_hands(&mut self.deck, &mut self.roster, self.hand_size)?;
        self.phase = RoundPhase::Dealt;
        Ok(())
    }

    /// Settle the bet and persist the updated point totals. A store
    /// failure is logged and skipped: the in-memory roster still carries
    /// the settled totals for broadcast.
    pub async fn settle(&mut self, store: &dyn PlayerStore) -> Result<(), RoundError> {
        self.expect_phase(RoundPhase::Dealt, "settle")?;
        scoring::settle_bet(self.bet, &mut self.roster);
        for player in &self.roster {
            if let Err(error) = store.update_points(player.id, player.points).await {
                warn!(
                    "failed to persist points for {}: {error}",
                    player.username
                );
            }
        }
        self.phase = RoundPhase::Settled;
        Ok(())
    }

    /// Determine the winners and hand everything back for broadcast,
    /// consuming the round.
    pub fn report(mut self) -> Result<RoundOutcome, RoundError> {
        self.expect_phase(RoundPhase::Settled, "report")?;
        self.phase = RoundPhase::Reported;
        let winners = scoring::determine_winners(&self.roster);
        let hands = self
            .roster
            .iter()
            .map(|player| (player.username.clone(), player.hand.clone()))
            .collect();
        Ok(RoundOutcome {
            hands,
            roster: self.roster,
            winners,
        })
    }

    /// Run the whole cycle.
    pub async fn run(mut self, store: &dyn PlayerStore) -> Result<RoundOutcome, RoundError> {
        self.deal()?;
        self.settle(store).await?;
        self.report()
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    fn expect_phase(&self, expected: RoundPhase, op: &'static str) -> Result<(), RoundError> {
        if self.phase != expected {
            return Err(RoundError::OutOfPhase {
                op,
                phase: self.phase,
            });
        }
        Ok(())
    }
}

fn deal_hands(
    deck: &mut Deck,
    roster: &mut [Player],
    hand_size: usize,
) -> Result<(), RoundError> {
    for _ in 0..hand_size {
        for player in roster.iter_mut() {
            let card = deck.deal().ok_or(RoundError::DeckExhausted)?;
            player.hand.push(card);
        }
    }
    Ok(())
}
