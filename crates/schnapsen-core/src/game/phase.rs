use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Dealing,
    Bidding,
    Playing,
    Ended,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Dealing => "DEALING",
            Phase::Bidding => "BIDDING",
            Phase::Playing => "PLAYING",
            Phase::Ended => "ENDED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Phase::Ended)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
