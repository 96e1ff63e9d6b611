use crate::model::deck::DECK_SIZE;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_NO_PLAYERS: usize = 3;
pub const DEFAULT_VICTORY_THRESHOLD: u32 = 1_000;

const DEFAULT_CARD_POINTS: [u32; 6] = [0, 10, 2, 3, 4, 11];
const DEFAULT_MARRIAGE_BONUSES: [u32; 4] = [60, 80, 100, 40];

/// Points collected for each rank when a trick is won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u32>", into = "BTreeMap<String, u32>")]
pub struct ScoreTable {
    points: [u32; 6],
}

impl ScoreTable {
    pub const fn new(points: [u32; 6]) -> Self {
        Self { points }
    }

    pub fn points(&self, rank: Rank) -> u32 {
        self.points[rank.index()]
    }
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self::new(DEFAULT_CARD_POINTS)
    }
}

impl TryFrom<BTreeMap<String, u32>> for ScoreTable {
    type Error = RulesError;

    fn try_from(map: BTreeMap<String, u32>) -> Result<Self, Self::Error> {
        let mut points: [Option<u32>; 6] = [None; 6];
        for (symbol, value) in map {
            let rank = Rank::from_symbol(&symbol).ok_or(RulesError::UnknownRank(symbol))?;
            points[rank.index()] = Some(value);
        }
        let mut table = [0u32; 6];
        for rank in Rank::ORDERED {
            table[rank.index()] = points[rank.index()].ok_or(RulesError::MissingRank(rank))?;
        }
        Ok(Self::new(table))
    }
}

impl From<ScoreTable> for BTreeMap<String, u32> {
    fn from(table: ScoreTable) -> Self {
        Rank::ORDERED
            .iter()
            .map(|rank| (rank.symbol().to_string(), table.points(*rank)))
            .collect()
    }
}

/// Bonus awarded for declaring a marriage, keyed by suit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u32>", into = "BTreeMap<String, u32>")]
pub struct MarriageBonuses {
    bonuses: [u32; 4],
}

impl MarriageBonuses {
    pub const fn new(bonuses: [u32; 4]) -> Self {
        Self { bonuses }
    }

    pub fn bonus(&self, suit: Suit) -> u32 {
        self.bonuses[suit.index()]
    }
}

impl Default for MarriageBonuses {
    fn default() -> Self {
        Self::new(DEFAULT_MARRIAGE_BONUSES)
    }
}

impl TryFrom<BTreeMap<String, u32>> for MarriageBonuses {
    type Error = RulesError;

    fn try_from(map: BTreeMap<String, u32>) -> Result<Self, Self::Error> {
        let mut bonuses: [Option<u32>; 4] = [None; 4];
        for (code, value) in map {
            let suit = Suit::from_code(&code).ok_or(RulesError::UnknownSuit(code))?;
            bonuses[suit.index()] = Some(value);
        }
        let mut table = [0u32; 4];
        for suit in Suit::ALL {
            table[suit.index()] = bonuses[suit.index()].ok_or(RulesError::MissingSuit(suit))?;
        }
        Ok(Self::new(table))
    }
}

impl From<MarriageBonuses> for BTreeMap<String, u32> {
    fn from(table: MarriageBonuses) -> Self {
        Suit::ALL
            .iter()
            .map(|suit| (suit.code().to_string(), table.bonus(*suit)))
            .collect()
    }
}

/// The two lookup tables shipped as `card_scores.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreTables {
    pub cards: ScoreTable,
    pub trumps: MarriageBonuses,
}

impl ScoreTables {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Fixed parameters of one match. Built once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    pub no_players: usize,
    pub deck_size: usize,
    pub victory_threshold: u32,
    pub scores: ScoreTables,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            no_players: DEFAULT_NO_PLAYERS,
            deck_size: DECK_SIZE,
            victory_threshold: DEFAULT_VICTORY_THRESHOLD,
            scores: ScoreTables::default(),
        }
    }
}

impl Rules {
    pub fn card_points(&self) -> &ScoreTable {
        &self.scores.cards
    }

    pub fn marriage_bonuses(&self) -> &MarriageBonuses {
        &self.scores.trumps
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if !(2..=4).contains(&self.no_players) {
            return Err(RulesError::InvalidField {
                field: "no_players",
                message: format!("expected 2 to 4 players, got {}", self.no_players),
            });
        }
        if self.deck_size < self.no_players || self.deck_size > DECK_SIZE {
            return Err(RulesError::InvalidField {
                field: "deck_size",
                message: format!(
                    "deck size must be between {} and {DECK_SIZE}, got {}",
                    self.no_players, self.deck_size
                ),
            });
        }
        if self.victory_threshold == 0 {
            return Err(RulesError::InvalidField {
                field: "victory_threshold",
                message: "victory threshold must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("unknown rank '{0}' in card score table")]
    UnknownRank(String),
    #[error("card score table has no entry for rank {0}")]
    MissingRank(Rank),
    #[error("unknown suit '{0}' in marriage bonus table")]
    UnknownSuit(String),
    #[error("marriage bonus table has no entry for suit {0}")]
    MissingSuit(Suit),
    #[error("{field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}
