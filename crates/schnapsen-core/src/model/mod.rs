pub mod card;
pub mod deck;
pub mod player;
pub mod rank;
pub mod rules;
pub mod suit;
pub mod trick;

pub use card::{Card, CardLabel, LabelError};
pub use deck::{DECK_SIZE, Deck};
pub use player::{Player, PlayerId};
pub use rank::Rank;
pub use rules::{MarriageBonuses, Rules, RulesError, ScoreTable, ScoreTables};
pub use suit::Suit;
pub use trick::{Marriage, TrickContext, TrickError, TrickResolution};
