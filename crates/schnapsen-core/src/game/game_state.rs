use crate::evidence::aggregator::{ConfirmMode, EvidenceAggregator, EvidenceConfig, EvidenceError};
use crate::evidence::observation::Observation;
use crate::game::bidding::run_auction;
use crate::game::events::GameEvent;
use crate::game::phase::Phase;
use crate::model::card::{Card, CardLabel};
use crate::model::player::{Player, PlayerId};
use crate::model::rules::{Rules, RulesError};
use crate::model::suit::Suit;
use crate::model::trick::{self, TrickContext, TrickError};
use std::collections::HashSet;
use std::mem;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("invalid rules: {0}")]
    Rules(#[from] RulesError),
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
    #[error("trick {trick} cannot be resolved: {source}")]
    Trick {
        trick: usize,
        #[source]
        source: TrickError,
    },
    #[error("{player} is not seated in a {players}-player game")]
    UnknownPlayer { player: PlayerId, players: usize },
}

/// Phase machine that turns merged detector batches into game events.
///
/// One call to [`Game::tick`] per merged batch, in arrival order. A fatal
/// error leaves the state as it was before the call.
#[derive(Debug, Clone)]
pub struct Game {
    rules: Rules,
    aggregator: EvidenceAggregator,
    phase: Phase,
    players: Vec<Player>,
    current_trump: Option<Suit>,
    round_starting_player: PlayerId,
    winner: Option<PlayerId>,
    cards_dealt: HashSet<CardLabel>,
    cards_played: HashSet<CardLabel>,
    cards_in_trick: Vec<Card>,
    tricks_completed: usize,
    ticks: u64,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(rules: Rules, evidence: EvidenceConfig) -> Result<Self, GameError> {
        rules.validate()?;
        evidence.validate()?;
        let players = (0..rules.no_players)
            .map(|index| Player::new(PlayerId::new(index)))
            .collect();

        Ok(Self {
            aggregator: EvidenceAggregator::new(evidence),
            phase: Phase::Dealing,
            players,
            current_trump: None,
            round_starting_player: PlayerId::new(0),
            winner: None,
            cards_dealt: HashSet::with_capacity(rules.deck_size),
            cards_played: HashSet::with_capacity(rules.deck_size),
            cards_in_trick: Vec::with_capacity(rules.no_players + 2),
            tricks_completed: 0,
            ticks: 0,
            events: Vec::new(),
            rules,
        })
    }

    /// Feeds one evidence batch. Returns the winner once the game has ended.
    pub fn tick(&mut self, batch: &[Observation]) -> Result<Option<PlayerId>, GameError> {
        match self.phase {
            Phase::Dealing => self.deal(batch)?,
            Phase::Bidding => self.bid(),
            Phase::Playing => self.play(batch)?,
            Phase::Ended => {}
        }
        self.ticks += 1;
        Ok(self.winner)
    }

    pub fn queue_bid(&mut self, player: PlayerId, bid: u32) -> Result<(), GameError> {
        let players = self.players.len();
        self.players
            .get_mut(player.index())
            .ok_or(GameError::UnknownPlayer { player, players })?
            .queue_bid(bid);
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_starting_player(&self) -> PlayerId {
        self.round_starting_player
    }

    pub fn current_trump(&self) -> Option<Suit> {
        self.current_trump
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn scores(&self) -> Vec<u32> {
        self.players.iter().map(Player::total_score).collect()
    }

    pub fn cards_dealt(&self) -> &HashSet<CardLabel> {
        &self.cards_dealt
    }

    pub fn cards_played(&self) -> &HashSet<CardLabel> {
        &self.cards_played
    }

    pub fn cards_in_trick(&self) -> &[Card] {
        &self.cards_in_trick
    }

    pub fn tricks_completed(&self) -> usize {
        self.tricks_completed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Hands over the events produced since the previous call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        mem::take(&mut self.events)
    }

    /// The current trick holds at least one card per player, marriage cards included.
    pub fn trick_is_complete(&self) -> bool {
        self.cards_in_trick.len() >= self.rules.no_players
    }

    fn deal(&mut self, batch: &[Observation]) -> Result<(), GameError> {
        let Some(label) =
            self.aggregator
                .confirm_entering_card(batch, &self.cards_dealt, ConfirmMode::Dealing)?
        else {
            return Ok(());
        };

        self.cards_dealt.insert(label);
        let dealt = self.cards_dealt.len();
        event!(
            target: "schnapsen_core::game",
            Level::DEBUG,
            card = %label,
            dealt,
            "card dealt"
        );
        self.events.push(GameEvent::CardDealt { card: label, dealt });

        if dealt == self.rules.deck_size {
            self.phase = Phase::Bidding;
            event!(
                target: "schnapsen_core::game",
                Level::INFO,
                cards = dealt,
                phase = %self.phase,
                "dealing complete"
            );
            self.events.push(GameEvent::DealingComplete { cards: dealt });
        }
        Ok(())
    }

    fn bid(&mut self) {
        match run_auction(&mut self.players) {
            Some(winning) => {
                self.round_starting_player = winning.player;
                event!(
                    target: "schnapsen_core::game",
                    Level::INFO,
                    player = winning.player.index(),
                    bid = winning.bid,
                    "bidding won"
                );
                self.events.push(GameEvent::BiddingWon {
                    player: winning.player,
                    bid: winning.bid,
                });
            }
            None => {
                event!(
                    target: "schnapsen_core::game",
                    Level::INFO,
                    starting_player = self.round_starting_player.index(),
                    "no bids placed"
                );
                self.events.push(GameEvent::BiddingSkipped {
                    starting_player: self.round_starting_player,
                });
            }
        }
        self.phase = Phase::Playing;
    }

    fn play(&mut self, batch: &[Observation]) -> Result<(), GameError> {
        if self.trick_is_complete() && self.aggregator.is_quiet(batch) {
            return self.resolve_trick();
        }

        let mut confirmed = self.cards_played.clone();
        confirmed.extend(self.cards_in_trick.iter().map(|card| card.label()));
        let Some(label) =
            self.aggregator
                .confirm_entering_card(batch, &confirmed, ConfirmMode::Playing)?
        else {
            return Ok(());
        };

        let card = Card::new(label, self.rules.card_points());
        let position = self.cards_in_trick.len();
        self.cards_in_trick.push(card);
        event!(
            target: "schnapsen_core::game",
            Level::DEBUG,
            card = %label,
            position,
            "card entered trick"
        );
        self.events.push(GameEvent::CardEntered {
            card: label,
            position,
        });
        Ok(())
    }

    fn resolve_trick(&mut self) -> Result<(), GameError> {
        let trick_number = self.tricks_completed + 1;
        let context = TrickContext {
            starting_player: self.round_starting_player,
            trump: self.current_trump,
            no_players: self.rules.no_players,
        };
        let resolution = trick::resolve(
            &self.cards_in_trick,
            &context,
            self.rules.marriage_bonuses(),
        )
        .map_err(|source| GameError::Trick {
            trick: trick_number,
            source,
        })?;

        for marriage in &resolution.marriages {
            self.players[marriage.player.index()].award_bonus(marriage.bonus);
            self.events.push(GameEvent::MarriageDeclared {
                player: marriage.player,
                suit: marriage.suit,
                bonus: marriage.bonus,
            });
        }

        let winner = resolution.winner;
        let points = self.players[winner.index()].award_cards(&resolution.plain_cards);
        let cards: Vec<CardLabel> = self.cards_in_trick.iter().map(|card| card.label()).collect();
        self.cards_played.extend(cards.iter().copied());
        self.cards_in_trick.clear();
        self.tricks_completed = trick_number;
        self.round_starting_player = winner;

        event!(
            target: "schnapsen_core::game",
            Level::INFO,
            trick = trick_number,
            player = winner.index(),
            points,
            winning_card = %resolution.winning_card,
            marriages = resolution.marriages.len(),
            "trick won"
        );
        self.events.push(GameEvent::TrickWon {
            trick: trick_number,
            player: winner,
            points,
            cards,
        });

        if let Some(suit) = resolution.declared_trump() {
            if self.current_trump != Some(suit) {
                self.current_trump = Some(suit);
                event!(
                    target: "schnapsen_core::game",
                    Level::INFO,
                    suit = %suit,
                    "trump changed"
                );
                self.events.push(GameEvent::TrumpChanged { suit });
            }
        }

        self.check_points();
        Ok(())
    }

    fn check_points(&mut self) {
        let threshold = self.rules.victory_threshold;
        let Some(leader) = self
            .players
            .iter()
            .find(|player| player.total_score() >= threshold)
        else {
            return;
        };

        let (player, score) = (leader.id(), leader.total_score());
        self.phase = Phase::Ended;
        self.winner = Some(player);
        event!(
            target: "schnapsen_core::game",
            Level::INFO,
            player = player.index(),
            score,
            threshold,
            "game won"
        );
        self.events.push(GameEvent::GameWon { player, score });
    }
}
