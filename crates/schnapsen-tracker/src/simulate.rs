//! Synthetic detector output for a seeded deal.
//!
//! The simulator plays a plausible game against its own shadow copy of the
//! rules and renders every step as camera frames: each newly visible card is
//! held for two full merge windows, each cleared table for two more. Frames
//! carry sub-threshold jitter and, at most once per window, a single stray
//! sighting, so the tracker has to filter noise to follow the deal.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use schnapsen_core::evidence::EvidenceConfig;
use schnapsen_core::game::bidding::run_auction;
use schnapsen_core::model::trick::{self, TrickContext, TrickError};
use schnapsen_core::model::{
    Card, CardLabel, Deck, Player, PlayerId, Rank, Rules, RulesError, Suit,
};
use schnapsen_core::Observation;
use thiserror::Error;
use tracing::{Level, event};

const HOLD_WINDOWS: usize = 2;
const JITTER_CHANCE: f64 = 0.3;
const STRAY_CHANCE: f64 = 0.5;
const MARRIAGE_CHANCE: f64 = 0.5;
const FOREIGN_LABELS: [&str; 4] = ["2H", "7D", "8S", "JOKER"];

/// A rendered deal together with the outcome the tracker should reach.
#[derive(Debug, Clone)]
pub struct SimulatedGame {
    pub frames: Vec<Vec<Observation>>,
    pub dealt: Vec<CardLabel>,
    pub starting_player: PlayerId,
    pub tricks: usize,
    pub marriages: usize,
    pub expected_scores: Vec<u32>,
    pub expected_winner: Option<PlayerId>,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("merge window of {window} frames cannot show a card more than {min_occurrences} times")]
    WindowTooSmall {
        window: usize,
        min_occurrences: usize,
    },
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error(transparent)]
    Trick(#[from] TrickError),
}

pub fn simulate(
    rules: &Rules,
    evidence: &EvidenceConfig,
    bids: &[Vec<u32>],
    window: usize,
    seed: u64,
) -> Result<SimulatedGame, SimulationError> {
    rules.validate()?;
    if window <= evidence.min_occurrences {
        return Err(SimulationError::WindowTooSmall {
            window,
            min_occurrences: evidence.min_occurrences,
        });
    }

    let no_players = rules.no_players;
    let mut deck = Deck::shuffled_with_seed(seed);
    deck.truncate(rules.deck_size);
    let dealt: Vec<CardLabel> = deck.cards().to_vec();
    let mut camera = Camera::new(evidence, window, seed);

    for card in &dealt {
        camera.show(&[*card]);
        camera.clear();
    }

    let mut players: Vec<Player> = (0..no_players)
        .map(|index| {
            let mut player = Player::new(PlayerId::new(index));
            for bid in bids.get(index).into_iter().flatten() {
                player.queue_bid(*bid);
            }
            player
        })
        .collect();
    let starting_player = run_auction(&mut players)
        .map(|winning| winning.player)
        .unwrap_or(PlayerId::new(0));

    let mut hands = deck.deal(no_players);

    let mut leader = starting_player;
    let mut trump: Option<Suit> = None;
    let mut scores = vec![0u32; no_players];
    let mut tricks = 0usize;
    let mut marriages = 0usize;
    let mut winner: Option<PlayerId> = None;

    while winner.is_none() {
        let Some(plan) = camera.plan_trick(&mut hands, leader) else {
            break;
        };

        let mut table = Vec::with_capacity(plan.len());
        for card in &plan {
            table.push(*card);
            camera.show(&table);
        }
        camera.clear();

        let cards: Vec<Card> = plan
            .iter()
            .map(|label| Card::new(*label, rules.card_points()))
            .collect();
        let context = TrickContext {
            starting_player: leader,
            trump,
            no_players,
        };
        let resolution = trick::resolve(&cards, &context, rules.marriage_bonuses())?;

        for marriage in &resolution.marriages {
            scores[marriage.player.index()] += marriage.bonus;
        }
        scores[resolution.winner.index()] += resolution.points();
        if let Some(suit) = resolution.declared_trump() {
            trump = Some(suit);
        }
        marriages += resolution.marriages.len();
        tricks += 1;
        leader = resolution.winner;
        winner = scores
            .iter()
            .position(|score| *score >= rules.victory_threshold)
            .map(PlayerId::new);
    }

    event!(
        target: "schnapsen_tracker::simulate",
        Level::DEBUG,
        seed,
        frames = camera.frames.len(),
        tricks,
        marriages,
        "simulated deal rendered"
    );

    Ok(SimulatedGame {
        frames: camera.frames,
        dealt,
        starting_player,
        tricks,
        marriages,
        expected_scores: scores,
        expected_winner: winner,
    })
}

struct Camera {
    rng: StdRng,
    window: usize,
    jitter_ceiling: f32,
    strays: bool,
    frames: Vec<Vec<Observation>>,
}

impl Camera {
    fn new(evidence: &EvidenceConfig, window: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed ^ 0x5eed_cafe),
            window,
            jitter_ceiling: evidence.confidence_threshold,
            strays: evidence.min_occurrences > 0,
            frames: Vec::new(),
        }
    }

    /// Frames showing `visible` on the table.
    fn show(&mut self, visible: &[CardLabel]) {
        for frame in 0..HOLD_WINDOWS * self.window {
            let mut detections: Vec<Observation> = visible
                .iter()
                .map(|label| Observation::new(label.to_string(), self.rng.gen_range(0.6..0.99)))
                .collect();
            self.jitter(&mut detections);
            if self.strays && frame % self.window == self.window / 2 && self.rng.gen_bool(STRAY_CHANCE)
            {
                detections.push(self.stray());
            }
            detections.shuffle(&mut self.rng);
            self.frames.push(detections);
        }
    }

    /// Frames of an empty table.
    fn clear(&mut self) {
        for _ in 0..HOLD_WINDOWS * self.window {
            let mut detections = Vec::new();
            self.jitter(&mut detections);
            self.frames.push(detections);
        }
    }

    fn jitter(&mut self, detections: &mut Vec<Observation>) {
        if !self.rng.gen_bool(JITTER_CHANCE) {
            return;
        }
        let label = self.any_card();
        let confidence = self.rng.gen_range(0.0..=self.jitter_ceiling);
        detections.push(Observation::new(label.to_string(), confidence));
    }

    /// One confident sighting that must not survive the occurrence filter.
    fn stray(&mut self) -> Observation {
        if self.rng.gen_bool(0.5) {
            let label = FOREIGN_LABELS[self.rng.gen_range(0..FOREIGN_LABELS.len())];
            Observation::new(label, 0.8)
        } else {
            Observation::new(self.any_card().to_string(), 0.7)
        }
    }

    fn any_card(&mut self) -> CardLabel {
        let rank = Rank::ORDERED[self.rng.gen_range(0..Rank::ORDERED.len())];
        let suit = Suit::ALL[self.rng.gen_range(0..Suit::ALL.len())];
        CardLabel::new(rank, suit)
    }

    /// Picks the cards of the next trick in table order, removing them from the hands.
    ///
    /// The leader may open with a marriage. A plain Queen is never followed by
    /// its own King, so every trick holds exactly one plain card per seat.
    /// Returns `None` when some seat cannot follow.
    fn plan_trick(
        &mut self,
        hands: &mut [Vec<CardLabel>],
        leader: PlayerId,
    ) -> Option<Vec<CardLabel>> {
        let no_players = hands.len();
        let mut draft = hands.to_vec();
        let mut plan = Vec::with_capacity(no_players + 2);

        let lead = &mut draft[leader.index()];
        if lead.len() >= 3 && self.rng.gen_bool(MARRIAGE_CHANCE) {
            if let Some(suit) = marriage_suit(lead) {
                for rank in [Rank::Queen, Rank::King] {
                    let label = CardLabel::new(rank, suit);
                    lead.retain(|card| *card != label);
                    plan.push(label);
                }
            }
        }

        for offset in 0..no_players {
            let seat = leader.offset(offset, no_players).index();
            let last = offset + 1 == no_players;
            let blocked = match plan.last() {
                Some(previous) if offset > 0 && previous.rank == Rank::Queen => {
                    Some(CardLabel::new(Rank::King, previous.suit))
                }
                _ => None,
            };

            let hand = &mut draft[seat];
            let allowed: Vec<usize> = (0..hand.len())
                .filter(|index| Some(hand[*index]) != blocked)
                .collect();
            let preferred: Vec<usize> = allowed
                .iter()
                .copied()
                .filter(|index| last || hand[*index].rank != Rank::Queen)
                .collect();
            let pool = if preferred.is_empty() { &allowed } else { &preferred };
            let index = *pool.choose(&mut self.rng)?;
            plan.push(hand.remove(index));
        }

        hands.clone_from_slice(&draft);
        Some(plan)
    }
}

fn marriage_suit(hand: &[CardLabel]) -> Option<Suit> {
    Suit::ALL.into_iter().find(|suit| {
        hand.contains(&CardLabel::new(Rank::Queen, *suit))
            && hand.contains(&CardLabel::new(Rank::King, *suit))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use schnapsen_core::evidence::{EvidenceAggregator, MergeWindow};
    use std::collections::HashSet;

    fn simulate_default(seed: u64) -> SimulatedGame {
        simulate(
            &Rules::default(),
            &EvidenceConfig::default(),
            &[vec![100], vec![120], vec![0]],
            10,
            seed,
        )
        .expect("simulation")
    }

    #[test]
    fn same_seed_renders_the_same_frames() {
        let first = simulate_default(11);
        let second = simulate_default(11);
        assert_eq!(first.frames, second.frames);
        assert_eq!(first.expected_scores, second.expected_scores);
    }

    #[test]
    fn auction_winner_leads_the_first_trick() {
        let game = simulate_default(3);
        assert_eq!(game.starting_player, PlayerId::new(1));
        assert_eq!(game.dealt.len(), 24);
        assert!(game.tricks > 0);
    }

    #[test]
    fn short_deck_deals_the_top_of_the_shuffle() {
        let rules = Rules {
            deck_size: 12,
            ..Rules::default()
        };
        let game = simulate(&rules, &EvidenceConfig::default(), &[], 10, 4).expect("simulation");
        assert_eq!(game.dealt, Deck::shuffled_with_seed(4).cards()[..12].to_vec());
        assert!(game.tricks <= 4);
    }

    #[test]
    fn frames_line_up_with_whole_windows() {
        let game = simulate_default(5);
        assert_eq!(game.frames.len() % 10, 0);
    }

    #[test]
    fn only_dealt_cards_survive_the_filters() {
        let game = simulate_default(8);
        let aggregator = EvidenceAggregator::new(EvidenceConfig::default());
        let mut window = MergeWindow::new(10);
        let mut distinct = HashSet::new();
        for frame in game.frames {
            if let Some(batch) = window.push_frame(frame) {
                let confirmed = aggregator
                    .confirm_entering_card(
                        &batch,
                        &HashSet::new(),
                        schnapsen_core::evidence::ConfirmMode::Dealing,
                    )
                    .expect("no aborts");
                if let Some(label) = confirmed {
                    distinct.insert(label);
                }
            }
        }
        // Every confirmed label is one that was actually dealt.
        let dealt: HashSet<_> = game.dealt.iter().copied().collect();
        assert!(distinct.is_subset(&dealt));
        assert_eq!(distinct.len(), 24);
    }

    #[test]
    fn planned_tricks_never_pair_a_plain_queen_with_its_king() {
        let mut camera = Camera::new(&EvidenceConfig::default(), 10, 1);
        let q = |suit| CardLabel::new(Rank::Queen, suit);
        let k = |suit| CardLabel::new(Rank::King, suit);
        let mut hands = vec![
            vec![q(Suit::Hearts)],
            vec![k(Suit::Hearts), CardLabel::new(Rank::Nine, Suit::Clubs)],
            vec![CardLabel::new(Rank::Ace, Suit::Spades)],
        ];
        let plan = camera
            .plan_trick(&mut hands, PlayerId::new(0))
            .expect("trick can be played");
        assert_eq!(
            plan,
            vec![
                q(Suit::Hearts),
                CardLabel::new(Rank::Nine, Suit::Clubs),
                CardLabel::new(Rank::Ace, Suit::Spades),
            ]
        );
        assert_eq!(hands[1], vec![k(Suit::Hearts)]);
    }

    #[test]
    fn planning_stops_when_a_seat_cannot_follow() {
        let mut camera = Camera::new(&EvidenceConfig::default(), 10, 1);
        let mut hands = vec![
            vec![CardLabel::new(Rank::Queen, Suit::Hearts)],
            vec![CardLabel::new(Rank::King, Suit::Hearts)],
            vec![CardLabel::new(Rank::Ace, Suit::Spades)],
        ];
        let before = hands.clone();
        assert!(camera.plan_trick(&mut hands, PlayerId::new(0)).is_none());
        assert_eq!(hands, before);
    }

    #[test]
    fn rejects_windows_that_cannot_clear_the_filter() {
        let err = simulate(
            &Rules::default(),
            &EvidenceConfig::default(),
            &[],
            5,
            1,
        )
        .expect_err("window too small");
        assert!(matches!(
            err,
            SimulationError::WindowTooSmall {
                window: 5,
                min_occurrences: 5
            }
        ));
    }
}
