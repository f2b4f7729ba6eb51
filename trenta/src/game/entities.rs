use chrono::NaiveDate;
use rand::{rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Number of cards dealt to each player per round.
pub const DEFAULT_HAND_SIZE: usize = 3;

/// Points a freshly registered player starts with.
pub const DEFAULT_STARTING_POINTS: i32 = 100;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Club, Self::Spade, Self::Diamond, Self::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Self; 13] = [
        Self::Ace,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::Jack,
        Self::Queen,
        Self::King,
    ];

    /// Betting value of the rank: pip cards count their pips, face cards
    /// count ten, the ace counts one.
    pub const fn value(self) -> u32 {
        match self {
            Self::Ace => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten | Self::Jack | Self::Queen | Self::King => 10,
        }
    }

    /// Tie-break precedence. A strict total order used only when hand
    /// values tie: King highest (1) down to Ace lowest (13).
    pub const fn precedence(self) -> u8 {
        match self {
            Self::King => 1,
            Self::Queen => 2,
            Self::Jack => 3,
            Self::Ten => 4,
            Self::Nine => 5,
            Self::Eight => 6,
            Self::Seven => 7,
            Self::Six => 8,
            Self::Five => 9,
            Self::Four => 10,
            Self::Three => 11,
            Self::Two => 12,
            Self::Ace => 13,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Ace => "A",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            rank => return write!(f, "{}", rank.value()),
        };
        write!(f, "{repr}")
    }
}

/// A playing card. Equality is value-based on (suit, rank).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = format!("{}/{}", self.rank, self.suit);
        write!(f, "{repr:>4}")
    }
}

/// A standard 52-card deck with a cursor marking the next undealt card.
///
/// The cursor only moves forward between shuffles; dealing past the end
/// yields `None` rather than wrapping or panicking.
#[derive(Debug)]
pub struct Deck {
    cards: [Card; 52],
    deck_idx: usize,
}

impl Deck {
    /// Deal the next card, or `None` once the deck is exhausted.
    pub fn deal(&mut self) -> Option<Card> {
        let card = self.cards.get(self.deck_idx).copied();
        if card.is_some() {
            self.deck_idx += 1;
        }
        card
    }

    /// Uniformly permute all 52 cards and reset the cursor.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rng());
    }

    pub fn shuffle_with<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.deck_idx = 0;
    }

    pub fn remaining(&self) -> usize {
        52 - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = [Card {
            suit: Suit::Club,
            rank: Rank::Ace,
        }; 52];
        for (i, rank) in Rank::ALL.into_iter().enumerate() {
            for (j, suit) in Suit::ALL.into_iter().enumerate() {
                cards[4 * i + j] = Card { suit, rank };
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// A player record.
///
/// Identity (`id`, unique `username`, password hash) and profile are
/// durable and owned by the player store; `points` is mutable game state
/// persisted through the store; `hand` is reconstructed every round and
/// never part of durable identity. The password hash never crosses the
/// wire.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Player {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub points: i32,
    pub is_admin: bool,
    #[serde(default)]
    pub hand: Vec<Card>,
}

impl Player {
    /// A new, unregistered player with a default profile and the starting
    /// point total. The store assigns the id on `add`.
    pub fn new(username: &str) -> Self {
        Self {
            id: 0,
            username: username.to_string(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            date_of_birth: NaiveDate::default(),
            points: DEFAULT_STARTING_POINTS,
            is_admin: false,
            hand: Vec::new(),
        }
    }
}

// Usernames are unique, so identity equality is username equality.
impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.username.hash(state);
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({} pts)", self.username, self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fresh_deck_has_52_distinct_cards() {
        let mut deck = Deck::default();
        let mut seen = HashSet::new();
        while let Some(card) = deck.deal() {
            assert!(seen.insert(card), "duplicate card {card}");
        }
        assert_eq!(seen.len(), 52);
    }

    #[test]
    fn dealing_past_the_end_yields_none() {
        let mut deck = Deck::default();
        for _ in 0..52 {
            assert!(deck.deal().is_some());
        }
        assert!(deck.deal().is_none());
        assert!(deck.deal().is_none());
        assert_eq!(deck.remaining(), 0);
    }

    #[test]
    fn shuffle_resets_the_cursor() {
        let mut deck = Deck::default();
        for _ in 0..52 {
            deck.deal();
        }
        deck.shuffle();
        assert_eq!(deck.remaining(), 52);
        for _ in 0..52 {
            assert!(deck.deal().is_some());
        }
        assert!(deck.deal().is_none());
    }

    #[test]
    fn face_cards_are_worth_ten() {
        assert_eq!(Rank::Jack.value(), 10);
        assert_eq!(Rank::Queen.value(), 10);
        assert_eq!(Rank::King.value(), 10);
        assert_eq!(Rank::Ace.value(), 1);
        assert_eq!(Rank::Seven.value(), 7);
    }

    #[test]
    fn precedence_is_a_strict_total_order_king_high() {
        assert_eq!(Rank::King.precedence(), 1);
        assert_eq!(Rank::Ace.precedence(), 13);
        let mut seen = HashSet::new();
        for rank in Rank::ALL {
            assert!(seen.insert(rank.precedence()));
        }
        assert_eq!(seen.len(), 13);
    }

    #[test]
    fn player_identity_is_username_based() {
        let mut alice = Player::new("alice");
        let alice_again = Player::new("alice");
        alice.points = 42;
        assert_eq!(alice, alice_again);
        assert_ne!(alice, Player::new("bob"));
    }

    #[test]
    fn new_player_starts_with_default_points_and_empty_hand() {
        let player = Player::new("carol");
        assert_eq!(player.points, DEFAULT_STARTING_POINTS);
        assert!(player.hand.is_empty());
        assert!(!player.is_admin);
    }

    #[test]
    fn card_display() {
        let card = Card {
            suit: Suit::Heart,
            rank: Rank::King,
        };
        assert_eq!(card.to_string().trim(), "K/♥");
    }
}
