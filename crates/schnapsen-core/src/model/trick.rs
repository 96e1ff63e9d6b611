use crate::model::card::Card;
use crate::model::player::PlayerId;
use crate::model::rules::MarriageBonuses;
use crate::model::suit::Suit;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

/// Seat and trump state a trick is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrickContext {
    pub starting_player: PlayerId,
    pub trump: Option<Suit>,
    pub no_players: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Marriage {
    pub suit: Suit,
    pub player: PlayerId,
    pub bonus: u32,
}

#[derive(Debug, Clone)]
pub struct TrickResolution {
    pub winner: PlayerId,
    pub winning_card: Card,
    /// Cards that took part in the trick, in play order. Marriage pairs are excluded.
    pub plain_cards: Vec<Card>,
    pub marriages: Vec<Marriage>,
}

impl TrickResolution {
    pub fn points(&self) -> u32 {
        self.plain_cards.iter().map(|card| card.score()).sum()
    }

    /// Suit of the last marriage declared in the trick.
    pub fn declared_trump(&self) -> Option<Suit> {
        self.marriages.last().map(|marriage| marriage.suit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("trick holds {found} plain cards ({total} cards seen), expected {expected}")]
    CardCount {
        expected: usize,
        found: usize,
        total: usize,
    },
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Plain(Card),
    Marriage { suit: Suit, plays_before: usize },
}

/// Splits the trick into plain plays and Queen+King declarations.
///
/// A Queen is held back until the next card arrives. A King of the same suit
/// turns the pair into a marriage; anything else releases the Queen as an
/// ordinary play ahead of that card. A Queen still held at the end is a play.
fn pair_marriages(cards: &[Card]) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(cards.len());
    let mut pending: Option<Card> = None;
    let mut plays = 0usize;

    for &card in cards {
        if card.is_queen() {
            if let Some(orphan) = pending.replace(card) {
                slots.push(Slot::Plain(orphan));
                plays += 1;
            }
            continue;
        }

        match pending.take() {
            Some(queen) if card.is_king() && queen.suit() == card.suit() => {
                slots.push(Slot::Marriage {
                    suit: card.suit(),
                    plays_before: plays,
                });
            }
            orphan => {
                if let Some(queen) = orphan {
                    slots.push(Slot::Plain(queen));
                    plays += 1;
                }
                slots.push(Slot::Plain(card));
                plays += 1;
            }
        }
    }

    if let Some(queen) = pending {
        slots.push(Slot::Plain(queen));
    }

    slots
}

/// Number of cards that count towards the trick once marriages are paired off.
fn plain_count(slots: &[Slot]) -> usize {
    slots
        .iter()
        .filter(|slot| matches!(slot, Slot::Plain(_)))
        .count()
}

/// Resolves a finished trick without touching any game state.
pub fn resolve(
    cards: &[Card],
    context: &TrickContext,
    bonuses: &MarriageBonuses,
) -> Result<TrickResolution, TrickError> {
    let slots = pair_marriages(cards);
    let count_error = |found| TrickError::CardCount {
        expected: context.no_players,
        found,
        total: cards.len(),
    };

    let found = plain_count(&slots);
    if found != context.no_players {
        return Err(count_error(found));
    }

    let mut plain_cards = Vec::with_capacity(found);
    let mut marriages = Vec::new();
    let mut pivot: Option<(Card, PlayerId)> = None;

    for slot in slots {
        match slot {
            Slot::Marriage { suit, plays_before } => {
                let player = context
                    .starting_player
                    .offset(plays_before, context.no_players);
                let bonus = bonuses.bonus(suit);
                event!(
                    target: "schnapsen_core::trick",
                    Level::DEBUG,
                    player = player.index(),
                    suit = %suit,
                    bonus,
                    "marriage declared"
                );
                marriages.push(Marriage { suit, player, bonus });
            }
            Slot::Plain(card) => {
                let player = context
                    .starting_player
                    .offset(plain_cards.len(), context.no_players);
                plain_cards.push(card);
                pivot = match pivot {
                    None => Some((card, player)),
                    Some((current, _)) if card.suit() == current.suit() && card > current => {
                        Some((card, player))
                    }
                    Some((current, _))
                        if Some(card.suit()) == context.trump && current.suit() != card.suit() =>
                    {
                        Some((card, player))
                    }
                    unchanged => unchanged,
                };
            }
        }
    }

    let (winning_card, winner) = pivot.ok_or_else(|| count_error(0))?;
    Ok(TrickResolution {
        winner,
        winning_card,
        plain_cards,
        marriages,
    })
}
