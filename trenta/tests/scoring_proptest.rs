//! Property tests for the scoring engine.

use proptest::prelude::*;
use trenta::{scoring, Card, Player, Rank, Suit};

fn arb_card() -> impl Strategy<Value = Card> {
    (0..4usize, 0..13usize).prop_map(|(suit, rank)| Card {
        suit: Suit::ALL[suit],
        rank: Rank::ALL[rank],
    })
}

fn arb_roster() -> impl Strategy<Value = Vec<Player>> {
    prop::collection::vec(prop::collection::vec(arb_card(), 0..=3), 2..6).prop_map(|hands| {
        hands
            .into_iter()
            .enumerate()
            .map(|(i, hand)| {
                let mut player = Player::new(&format!("p{i}"));
                player.hand = hand;
                player
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn settlement_conserves_total_points(mut roster in arb_roster(), bet in 1i32..100) {
        let before: i32 = roster.iter().map(|p| p.points).sum();
        scoring::settle_bet(bet, &mut roster);
        let after: i32 = roster.iter().map(|p| p.points).sum();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn non_main_players_settle_only_against_the_main_player(
        mut roster in arb_roster(),
        bet in 1i32..100,
    ) {
        let before: Vec<i32> = roster.iter().map(|p| p.points).collect();
        scoring::settle_bet(bet, &mut roster);
        for (player, points_before) in roster.iter().zip(&before).skip(1) {
            let delta = player.points - points_before;
            prop_assert!(
                delta == 0 || delta == bet || delta == -bet,
                "non-main delta {} is more than one bet",
                delta
            );
        }
    }

    #[test]
    fn winners_hold_the_maximum_hand_value(roster in arb_roster()) {
        let winners = scoring::determine_winners(&roster);
        prop_assert!(!winners.is_empty());
        let max_value = roster
            .iter()
            .map(|p| scoring::hand_value(&p.hand))
            .max()
            .unwrap();
        for winner in &winners {
            prop_assert_eq!(scoring::hand_value(&winner.hand), max_value);
        }
    }

    #[test]
    fn winners_are_drawn_from_the_roster(roster in arb_roster()) {
        let winners = scoring::determine_winners(&roster);
        for winner in &winners {
            prop_assert!(roster.iter().any(|p| p == winner));
        }
    }

    #[test]
    fn tie_break_never_eliminates_everyone(roster in arb_roster()) {
        // Whatever the hands look like, the winner set after precedence
        // resolution is still a non-empty subset of the value-tied set.
        let max_value = roster
            .iter()
            .map(|p| scoring::hand_value(&p.hand))
            .max()
            .unwrap();
        let tied: Vec<&Player> = roster
            .iter()
            .filter(|p| scoring::hand_value(&p.hand) == max_value)
            .collect();
        let resolved = scoring::resolve_by_precedence(&tied);
        prop_assert!(!resolved.is_empty());
        prop_assert!(resolved.len() <= tied.len());
    }
}
