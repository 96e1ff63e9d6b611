use crate::model::card::CardLabel;
use crate::model::player::PlayerId;
use crate::model::suit::Suit;
use serde::Serialize;

/// Something the tracker inferred from the evidence stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    CardDealt {
        card: CardLabel,
        dealt: usize,
    },
    DealingComplete {
        cards: usize,
    },
    BiddingWon {
        player: PlayerId,
        bid: u32,
    },
    BiddingSkipped {
        starting_player: PlayerId,
    },
    CardEntered {
        card: CardLabel,
        position: usize,
    },
    MarriageDeclared {
        player: PlayerId,
        suit: Suit,
        bonus: u32,
    },
    TrumpChanged {
        suit: Suit,
    },
    TrickWon {
        trick: usize,
        player: PlayerId,
        points: u32,
        cards: Vec<CardLabel>,
    },
    GameWon {
        player: PlayerId,
        score: u32,
    },
}

impl GameEvent {
    pub const fn kind(&self) -> &'static str {
        match self {
            GameEvent::CardDealt { .. } => "card_dealt",
            GameEvent::DealingComplete { .. } => "dealing_complete",
            GameEvent::BiddingWon { .. } => "bidding_won",
            GameEvent::BiddingSkipped { .. } => "bidding_skipped",
            GameEvent::CardEntered { .. } => "card_entered",
            GameEvent::MarriageDeclared { .. } => "marriage_declared",
            GameEvent::TrumpChanged { .. } => "trump_changed",
            GameEvent::TrickWon { .. } => "trick_won",
            GameEvent::GameWon { .. } => "game_won",
        }
    }
}
