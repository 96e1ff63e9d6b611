use crate::model::card::CardLabel;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub const DECK_SIZE: usize = 24;

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<CardLabel>,
}

impl Deck {
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL.iter().copied() {
            for rank in Rank::ORDERED.iter().copied() {
                cards.push(CardLabel::new(rank, suit));
            }
        }
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Keeps only the first `len` cards; the rest stay undealt.
    pub fn truncate(&mut self, len: usize) {
        self.cards.truncate(len);
    }

    pub fn cards(&self) -> &[CardLabel] {
        &self.cards
    }

    /// Deals the cards round-robin, card `i` going to hand `i % hands`.
    pub fn deal(&self, hands: usize) -> Vec<Vec<CardLabel>> {
        let mut dealt = vec![Vec::with_capacity(self.cards.len() / hands.max(1) + 1); hands];
        if hands == 0 {
            return dealt;
        }
        for (index, card) in self.cards.iter().enumerate() {
            dealt[index % hands].push(*card);
        }
        dealt
    }
}

#[cfg(test)]
mod tests {
    use super::{DECK_SIZE, Deck};
    use std::collections::HashSet;

    #[test]
    fn standard_deck_has_24_unique_cards() {
        let deck = Deck::standard();
        assert_eq!(deck.cards().len(), DECK_SIZE);
        let unique: HashSet<_> = deck.cards().iter().collect();
        assert_eq!(unique.len(), DECK_SIZE);
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let deck_a = Deck::shuffled_with_seed(42);
        let deck_b = Deck::shuffled_with_seed(42);
        assert_eq!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn shuffle_with_different_seeds_differs() {
        let deck_a = Deck::shuffled_with_seed(1);
        let deck_b = Deck::shuffled_with_seed(2);
        assert_ne!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn deal_splits_evenly_between_three_players() {
        let hands = Deck::standard().deal(3);
        assert_eq!(hands.len(), 3);
        assert!(hands.iter().all(|hand| hand.len() == 8));
    }

    #[test]
    fn truncated_deck_deals_only_the_kept_cards() {
        let mut deck = Deck::shuffled_with_seed(7);
        let top: Vec<_> = deck.cards()[..5].to_vec();
        deck.truncate(5);
        assert_eq!(deck.cards(), top.as_slice());

        let hands = deck.deal(3);
        assert_eq!(hands[0], vec![top[0], top[3]]);
        assert_eq!(hands[1], vec![top[1], top[4]]);
        assert_eq!(hands[2], vec![top[2]]);
    }
}
