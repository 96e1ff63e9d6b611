use super::game_state::Game;
use super::phase::Phase;
use crate::model::player::PlayerId;
use crate::model::suit::Suit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub scores: Vec<u32>,
    pub starting_player: PlayerId,
    pub trump: Option<Suit>,
    pub winner: Option<PlayerId>,
    pub ticks: u64,
    pub tricks_completed: usize,
    pub cards_dealt: usize,
    pub cards_played: usize,
    #[serde(default)]
    pub cards_in_trick: Vec<String>,
}

impl GameSnapshot {
    pub fn capture(game: &Game) -> Self {
        GameSnapshot {
            phase: game.phase(),
            scores: game.scores(),
            starting_player: game.current_starting_player(),
            trump: game.current_trump(),
            winner: game.winner(),
            ticks: game.ticks(),
            tricks_completed: game.tricks_completed(),
            cards_dealt: game.cards_dealt().len(),
            cards_played: game.cards_played().len(),
            cards_in_trick: game
                .cards_in_trick()
                .iter()
                .map(|card| card.to_string())
                .collect(),
        }
    }

    pub fn leader(&self) -> Option<PlayerId> {
        self.scores
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
            .map(|(index, _)| PlayerId::new(index))
    }

    pub fn to_json(game: &Game) -> serde_json::Result<String> {
        let snapshot = Self::capture(game);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::GameSnapshot;
    use crate::evidence::aggregator::EvidenceConfig;
    use crate::game::game_state::Game;
    use crate::game::phase::Phase;
    use crate::model::player::PlayerId;
    use crate::model::rules::Rules;

    #[test]
    fn snapshot_serializes_to_json() {
        let game = Game::new(Rules::default(), EvidenceConfig::default()).unwrap();
        let json = GameSnapshot::to_json(&game).unwrap();
        assert!(json.contains("\"phase\": \"DEALING\""));
        assert!(json.contains("\"winner\": null"));
    }

    #[test]
    fn snapshot_roundtrip_keeps_counters() {
        let game = Game::new(Rules::default(), EvidenceConfig::default()).unwrap();
        let snapshot = GameSnapshot::capture(&game);
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored = GameSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
        assert_eq!(restored.scores, vec![0, 0, 0]);
    }

    #[test]
    fn leader_prefers_lowest_seat_on_ties() {
        let snapshot = GameSnapshot {
            phase: Phase::Playing,
            scores: vec![40, 63, 63],
            starting_player: PlayerId::new(0),
            trump: None,
            winner: None,
            ticks: 0,
            tricks_completed: 2,
            cards_dealt: 24,
            cards_played: 8,
            cards_in_trick: Vec::new(),
        };
        assert_eq!(snapshot.leader(), Some(PlayerId::new(1)));
    }

    #[test]
    fn from_json_tolerates_missing_trick_cards() {
        let legacy = r#"{
            "phase": "PLAYING",
            "scores": [10, 0, 5],
            "starting_player": 2,
            "trump": "Hearts",
            "winner": null,
            "ticks": 40,
            "tricks_completed": 1,
            "cards_dealt": 24,
            "cards_played": 3
        }"#;
        let snapshot = GameSnapshot::from_json(legacy).unwrap();
        assert_eq!(snapshot.starting_player, PlayerId::new(2));
        assert!(snapshot.cards_in_trick.is_empty());
    }
}
