use schnapsen_core::evidence::aggregator::EvidenceConfig;
use schnapsen_core::evidence::observation::{MergeWindow, Observation};
use schnapsen_core::game::events::GameEvent;
use schnapsen_core::game::game_state::Game;
use schnapsen_core::game::phase::Phase;
use schnapsen_core::model::card::CardLabel;
use schnapsen_core::model::deck::Deck;
use schnapsen_core::model::player::PlayerId;
use schnapsen_core::model::rank::Rank;
use schnapsen_core::model::rules::Rules;
use std::collections::HashSet;

const WINDOW: usize = 10;

/// Frames showing `visible` steadily, with a sprinkle of sub-threshold noise.
fn frames(visible: &[CardLabel], count: usize) -> Vec<Vec<Observation>> {
    (0..count)
        .map(|frame| {
            let mut observations: Vec<Observation> = visible
                .iter()
                .map(|label| Observation::new(label.to_string(), 0.9))
                .collect();
            if frame % 3 == 0 {
                observations.push(Observation::new("AH", 0.1));
                observations.push(Observation::new("2S", 0.2));
            }
            observations
        })
        .collect()
}

struct Harness {
    game: Game,
    window: MergeWindow,
    scores: Vec<u32>,
    events: Vec<GameEvent>,
}

impl Harness {
    fn new(rules: Rules) -> Self {
        let game = Game::new(rules, EvidenceConfig::default()).expect("valid rules");
        let scores = game.scores();
        Self {
            game,
            window: MergeWindow::new(WINDOW),
            scores,
            events: Vec::new(),
        }
    }

    fn feed(&mut self, frames: Vec<Vec<Observation>>) {
        for frame in frames {
            if let Some(batch) = self.window.push_frame(frame) {
                self.game.tick(&batch).expect("no structural errors");
                let scores = self.game.scores();
                for (before, after) in self.scores.iter().zip(&scores) {
                    assert!(after >= before, "scores must never decrease");
                }
                self.scores = scores;
                self.events.extend(self.game.drain_events());
            }
        }
    }
}

#[test]
fn plays_a_full_deal_from_noisy_frames() {
    let deck = Deck::shuffled_with_seed(2024);
    let mut harness = Harness::new(Rules::default());

    for card in deck.cards() {
        harness.feed(frames(&[*card], 2 * WINDOW));
        harness.feed(frames(&[], WINDOW));
    }
    harness.feed(frames(&[], WINDOW));
    assert_eq!(harness.game.phase(), Phase::Playing);
    assert_eq!(harness.game.current_starting_player(), PlayerId::new(0));

    // Queens stay in hand so every trick is plain.
    let mut hands = deck.deal(3);
    for hand in hands.iter_mut() {
        hand.retain(|card| card.rank != Rank::Queen);
    }
    let tricks = hands.iter().map(Vec::len).min().unwrap_or(0);

    for _ in 0..tricks {
        let leader = harness.game.current_starting_player().index();
        let mut table = Vec::new();
        for offset in 0..3 {
            let seat = (leader + offset) % 3;
            table.push(hands[seat].remove(0));
            harness.feed(frames(&table, 2 * WINDOW));
        }
        harness.feed(frames(&[], 2 * WINDOW));
    }

    assert_eq!(harness.game.tricks_completed(), tricks);
    assert!(harness.game.cards_in_trick().is_empty());

    let played: HashSet<_> = harness.game.cards_played().iter().copied().collect();
    assert_eq!(played.len(), tricks * 3);

    let dealt = harness
        .events
        .iter()
        .filter(|event| matches!(event, GameEvent::CardDealt { .. }))
        .count();
    assert_eq!(dealt, 24);

    let trick_points: u32 = harness
        .events
        .iter()
        .filter_map(|event| match event {
            GameEvent::TrickWon { points, .. } => Some(*points),
            _ => None,
        })
        .sum();
    assert_eq!(trick_points, harness.game.scores().iter().sum::<u32>());
}

#[test]
fn reaching_the_threshold_ends_the_game_on_that_tick() {
    let rules = Rules {
        deck_size: 3,
        victory_threshold: 100,
        ..Rules::default()
    };
    let mut harness = Harness::new(rules);
    for label in ["9C", "10C", "JC"] {
        harness.feed(frames(&[label.parse().unwrap()], WINDOW));
    }
    harness.feed(frames(&[], WINDOW));
    assert_eq!(harness.game.phase(), Phase::Playing);

    // The hearts marriage (100) is worth exactly the threshold.
    let trick: Vec<CardLabel> = ["QH", "KH", "9D", "10D", "AS"]
        .iter()
        .map(|label| label.parse().unwrap())
        .collect();
    for shown in 1..=trick.len() {
        harness.feed(frames(&trick[..shown], WINDOW));
    }
    assert_eq!(harness.game.phase(), Phase::Playing);

    harness.feed(frames(&[], WINDOW));
    assert_eq!(harness.game.phase(), Phase::Ended);
    assert_eq!(harness.game.winner(), Some(PlayerId::new(0)));
    assert_eq!(harness.game.scores(), vec![100, 21, 0]);

    harness.feed(frames(&trick, 3 * WINDOW));
    assert_eq!(harness.game.winner(), Some(PlayerId::new(0)));
    assert_eq!(harness.game.scores(), vec![100, 21, 0]);
    assert!(matches!(
        harness.events.last(),
        Some(GameEvent::GameWon { score: 100, .. })
    ));
}
