use crate::model::rank::Rank;
use crate::model::rules::ScoreTable;
use crate::model::suit::Suit;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Identity of a physical card, as written by the detector (`"10S"`, `"QH"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardLabel {
    pub rank: Rank,
    pub suit: Suit,
}

impl CardLabel {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{label}' is not a known card label")]
pub struct LabelError {
    pub label: String,
}

impl FromStr for CardLabel {
    type Err = LabelError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let error = || LabelError {
            label: label.to_string(),
        };
        let split = label
            .char_indices()
            .last()
            .map(|(index, _)| index)
            .ok_or_else(error)?;
        let (rank, suit) = label.split_at(split);
        let rank = Rank::from_symbol(rank).ok_or_else(error)?;
        let suit = Suit::from_code(suit).ok_or_else(error)?;
        Ok(Self::new(rank, suit))
    }
}

impl fmt::Display for CardLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl Serialize for CardLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CardLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A confirmed card together with its point value.
///
/// Equality and ordering look at the score only, so two ranks worth the same
/// number of points compare equal. Use [`Card::label`] to compare identity.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Card {
    label: CardLabel,
    score: u32,
}

impl Card {
    pub fn new(label: CardLabel, points: &ScoreTable) -> Self {
        Self {
            label,
            score: points.points(label.rank),
        }
    }

    pub const fn label(self) -> CardLabel {
        self.label
    }

    pub const fn rank(self) -> Rank {
        self.label.rank
    }

    pub const fn suit(self) -> Suit {
        self.label.suit
    }

    pub const fn score(self) -> u32 {
        self.score
    }

    pub const fn is_queen(self) -> bool {
        matches!(self.label.rank, Rank::Queen)
    }

    pub const fn is_king(self) -> bool {
        matches!(self.label.rank, Rank::King)
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}

impl Eq for Card {}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.label.fmt(f)
    }
}
