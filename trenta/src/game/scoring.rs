//! The scoring engine: pure functions over cards and hands.
//!
//! No I/O and no state beyond the inputs. The round orchestrator is the
//! only caller; everything here is deterministic and cheap enough to run
//! inline on the lobby task.

use super::entities::{Card, Player};

/// Sum of the rank values in a hand. An unfilled slot simply isn't
/// there, so it contributes nothing.
pub fn hand_value(hand: &[Card]) -> u32 {
    hand.iter().map(|card| card.rank.value()).sum()
}

/// The best (lowest) tie-break precedence in a hand, or `None` for an
/// empty hand.
pub fn best_precedence(hand: &[Card]) -> Option<u8> {
    hand.iter().map(|card| card.rank.precedence()).min()
}

/// Every player whose hand value equals the maximum observed value.
/// Value ties are broken by [`resolve_by_precedence`]; a multi-player
/// result after that is a valid split outcome, not an error.
pub fn determine_winners(players: &[Player]) -> Vec<Player> {
    let Some(max_value) = players.iter().map(|p| hand_value(&p.hand)).max() else {
        return Vec::new();
    };
    let tied: Vec<&Player> = players
        .iter()
        .filter(|p| hand_value(&p.hand) == max_value)
        .collect();
    if tied.len() > 1 {
        resolve_by_precedence(&tied)
    } else {
        tied.into_iter().cloned().collect()
    }
}

/// Break a hand-value tie by card precedence: each tied player's best
/// card is their minimum precedence number, and the winners are everyone
/// whose best card matches the global minimum across the tied hands.
pub fn resolve_by_precedence(tied: &[&Player]) -> Vec<Player> {
    let Some(best) = tied.iter().filter_map(|p| best_precedence(&p.hand)).min() else {
        // All hands empty: nothing to separate them, everyone splits.
        return tied.iter().map(|p| (*p).clone()).collect();
    };
    tied.iter()
        .filter(|p| best_precedence(&p.hand) == Some(best))
        .map(|p| (*p).clone())
        .collect()
}

/// Settle the betting round. The first roster entry is the main player;
/// each other player compares hands against the main player only. A
/// strictly greater main hand moves `bet` from the opponent to the main
/// player, strictly less reverses the transfer, equal hands move
/// nothing. Non-main players never settle against each other.
pub fn settle_bet(bet: i32, roster: &mut [Player]) {
    let Some((main, others)) = roster.split_first_mut() else {
        return;
    };
    let main_value = hand_value(&main.hand);
    for other in others {
        let other_value = hand_value(&other.hand);
        if main_value > other_value {
            main.points += bet;
            other.points -= bet;
        } else if main_value < other_value {
            main.points -= bet;
            other.points += bet;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Rank, Suit};

    fn card(rank: Rank, suit: Suit) -> Card {
        Card { suit, rank }
    }

    fn player_with_hand(username: &str, hand: Vec<Card>) -> Player {
        let mut player = Player::new(username);
        player.hand = hand;
        player
    }

    #[test]
    fn hand_value_sums_rank_values() {
        let hand = vec![
            card(Rank::King, Suit::Club),
            card(Rank::Queen, Suit::Spade),
            card(Rank::Jack, Suit::Diamond),
        ];
        assert_eq!(hand_value(&hand), 30);
        assert_eq!(hand_value(&[]), 0);
    }

    #[test]
    fn short_hand_counts_only_dealt_cards() {
        let hand = vec![card(Rank::Nine, Suit::Heart)];
        assert_eq!(hand_value(&hand), 9);
    }

    #[test]
    fn highest_value_hand_wins_outright() {
        let players = vec![
            player_with_hand(
                "thirty",
                vec![
                    card(Rank::King, Suit::Club),
                    card(Rank::Queen, Suit::Spade),
                    card(Rank::Ten, Suit::Heart),
                ],
            ),
            player_with_hand(
                "twenty_four",
                vec![
                    card(Rank::Ten, Suit::Club),
                    card(Rank::Ten, Suit::Diamond),
                    card(Rank::Four, Suit::Spade),
                ],
            ),
            player_with_hand(
                "fifteen",
                vec![
                    card(Rank::Five, Suit::Club),
                    card(Rank::Five, Suit::Diamond),
                    card(Rank::Five, Suit::Heart),
                ],
            ),
        ];
        let winners = determine_winners(&players);
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].username, "thirty");
    }

    #[test]
    fn value_tie_is_broken_by_precedence() {
        // Both hands sum to 20; the king (precedence 1) beats the queen.
        let players = vec![
            player_with_hand(
                "with_king",
                vec![
                    card(Rank::King, Suit::Club),
                    card(Rank::Six, Suit::Spade),
                    card(Rank::Four, Suit::Heart),
                ],
            ),
            player_with_hand(
                "with_queen",
                vec![
                    card(Rank::Queen, Suit::Diamond),
                    card(Rank::Six, Suit::Heart),
                    card(Rank::Four, Suit::Club),
                ],
            ),
        ];
        let winners = determine_winners(&players);
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].username, "with_king");
    }

    #[test]
    fn equal_best_precedence_splits_the_pot() {
        let players = vec![
            player_with_hand(
                "a",
                vec![card(Rank::King, Suit::Club), card(Rank::Ten, Suit::Spade)],
            ),
            player_with_hand(
                "b",
                vec![card(Rank::King, Suit::Heart), card(Rank::Ten, Suit::Club)],
            ),
        ];
        let winners = determine_winners(&players);
        assert_eq!(winners.len(), 2);
    }

    #[test]
    fn settle_bet_compares_main_player_against_each_other() {
        let mut roster = vec![
            // Main player: value 20.
            player_with_hand(
                "main",
                vec![card(Rank::King, Suit::Club), card(Rank::Ten, Suit::Spade)],
            ),
            // Lower value: loses the bet to main.
            player_with_hand("low", vec![card(Rank::Five, Suit::Heart)]),
            // Higher value: takes the bet from main.
            player_with_hand(
                "high",
                vec![
                    card(Rank::King, Suit::Diamond),
                    card(Rank::Queen, Suit::Heart),
                    card(Rank::Jack, Suit::Spade),
                ],
            ),
        ];
        settle_bet(10, &mut roster);
        assert_eq!(roster[0].points, 100); // +10 from low, -10 to high
        assert_eq!(roster[1].points, 90);
        assert_eq!(roster[2].points, 110);
    }

    #[test]
    fn equal_hand_values_transfer_nothing() {
        let mut roster = vec![
            player_with_hand("main", vec![card(Rank::Ten, Suit::Club)]),
            player_with_hand("other", vec![card(Rank::Ten, Suit::Spade)]),
        ];
        settle_bet(25, &mut roster);
        assert_eq!(roster[0].points, 100);
        assert_eq!(roster[1].points, 100);
    }

    #[test]
    fn settle_bet_tolerates_tiny_rosters() {
        settle_bet(10, &mut []);
        let mut solo = vec![player_with_hand("only", vec![])];
        settle_bet(10, &mut solo);
        assert_eq!(solo[0].points, 100);
    }

    #[test]
    fn no_players_means_no_winners() {
        assert!(determine_winners(&[]).is_empty());
    }
}
