#![deny(warnings)]
pub mod evidence;
pub mod game;
pub mod model;

pub use evidence::{EvidenceAggregator, EvidenceConfig, MergeWindow, Observation};
pub use game::{Game, GameError, GameEvent, GameSnapshot, Phase};
pub use model::{Card, CardLabel, PlayerId, Rules, ScoreTables};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "schnapsen-tracker"
    }

    pub const fn game() -> &'static str {
        "Russian Schnapsen"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
