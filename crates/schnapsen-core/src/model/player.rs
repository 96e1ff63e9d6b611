use crate::model::card::Card;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Stable seat index, `0..no_players`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(usize);

impl PlayerId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// Seat reached after `steps` turns clockwise in a game of `no_players`.
    pub const fn offset(self, steps: usize, no_players: usize) -> Self {
        Self((self.0 + steps) % no_players)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    id: PlayerId,
    total_score: u32,
    cards_won: Vec<Card>,
    bid_queue: VecDeque<u32>,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            total_score: 0,
            cards_won: Vec::new(),
            bid_queue: VecDeque::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn cards_won(&self) -> &[Card] {
        &self.cards_won
    }

    /// Records won cards and adds their points. Returns the points added.
    pub fn award_cards(&mut self, cards: &[Card]) -> u32 {
        let points: u32 = cards.iter().map(|card| card.score()).sum();
        self.cards_won.extend_from_slice(cards);
        self.total_score = self.total_score.saturating_add(points);
        points
    }

    pub fn award_bonus(&mut self, points: u32) {
        self.total_score = self.total_score.saturating_add(points);
    }

    pub fn queue_bid(&mut self, bid: u32) {
        self.bid_queue.push_back(bid);
    }

    pub fn next_bid(&mut self) -> Option<u32> {
        self.bid_queue.pop_front()
    }

    pub fn pending_bids(&self) -> usize {
        self.bid_queue.len()
    }
}
