pub mod bidding;
pub mod events;
pub mod game_state;
pub mod phase;
pub mod serialization;

pub use bidding::WinningBid;
pub use events::GameEvent;
pub use game_state::{Game, GameError};
pub use phase::Phase;
pub use serialization::GameSnapshot;
