use crate::evidence::observation::Observation;
use crate::model::card::CardLabel;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{Level, event};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_MIN_OCCURRENCES: usize = 5;

/// What to do with a label that survives filtering but names no card in the deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLabelPolicy {
    /// Treat it as detector noise.
    #[default]
    Discard,
    /// Stop the game with [`EvidenceError::UnknownLabel`].
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvidenceConfig {
    /// Observations at or below this confidence are dropped.
    pub confidence_threshold: f32,
    /// A label must be seen strictly more often than this within one batch.
    pub min_occurrences: usize,
    pub unknown_labels: UnknownLabelPolicy,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_occurrences: DEFAULT_MIN_OCCURRENCES,
            unknown_labels: UnknownLabelPolicy::default(),
        }
    }
}

impl EvidenceConfig {
    pub fn validate(&self) -> Result<(), EvidenceError> {
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(EvidenceError::InvalidThreshold(self.confidence_threshold));
        }
        Ok(())
    }
}

/// Which confirmed set the batch is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    Dealing,
    Playing,
}

impl ConfirmMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConfirmMode::Dealing => "dealing",
            ConfirmMode::Playing => "playing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvidenceError {
    #[error("detector reported unknown card label '{label}' ({occurrences} sightings)")]
    UnknownLabel { label: String, occurrences: usize },
    #[error("confidence threshold must be within [0, 1), got {0}")]
    InvalidThreshold(f32),
}

#[derive(Debug)]
struct Tally<'a> {
    label: &'a str,
    occurrences: usize,
    best_confidence: f32,
}

/// Filters a merged batch of detections down to the one card that entered play.
#[derive(Debug, Clone, Default)]
pub struct EvidenceAggregator {
    config: EvidenceConfig,
}

impl EvidenceAggregator {
    pub fn new(config: EvidenceConfig) -> Self {
        Self { config }
    }

    /// True when no observation in the batch clears the confidence threshold.
    pub fn is_quiet(&self, batch: &[Observation]) -> bool {
        !batch.iter().any(|obs| self.is_confident(obs))
    }

    pub fn confirm_entering_card(
        &self,
        batch: &[Observation],
        already_confirmed: &HashSet<CardLabel>,
        mode: ConfirmMode,
    ) -> Result<Option<CardLabel>, EvidenceError> {
        let tallies = self.tally(batch);
        let mut best: Option<(CardLabel, f32)> = None;

        for tally in tallies {
            if tally.occurrences <= self.config.min_occurrences {
                continue;
            }

            let label = match tally.label.parse::<CardLabel>() {
                Ok(label) => label,
                Err(_) if self.config.unknown_labels == UnknownLabelPolicy::Discard => {
                    event!(
                        target: "schnapsen_core::evidence",
                        Level::DEBUG,
                        mode = mode.as_str(),
                        label = tally.label,
                        occurrences = tally.occurrences,
                        "discarding unknown label"
                    );
                    continue;
                }
                Err(_) => {
                    return Err(EvidenceError::UnknownLabel {
                        label: tally.label.to_string(),
                        occurrences: tally.occurrences,
                    });
                }
            };

            if already_confirmed.contains(&label) {
                continue;
            }

            if best.is_none_or(|(_, confidence)| tally.best_confidence > confidence) {
                best = Some((label, tally.best_confidence));
            }
        }

        if let Some((label, confidence)) = best {
            event!(
                target: "schnapsen_core::evidence",
                Level::TRACE,
                mode = mode.as_str(),
                card = %label,
                confidence = f64::from(confidence),
                "card confirmed"
            );
        }

        Ok(best.map(|(label, _)| label))
    }

    fn is_confident(&self, observation: &Observation) -> bool {
        observation.confidence > self.config.confidence_threshold
    }

    fn tally<'a>(&self, batch: &'a [Observation]) -> Vec<Tally<'a>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut tallies: Vec<Tally<'a>> = Vec::new();

        for observation in batch.iter().filter(|obs| self.is_confident(obs)) {
            let label = observation.label.as_str();
            match index.get(label) {
                Some(&slot) => {
                    let tally = &mut tallies[slot];
                    tally.occurrences += 1;
                    if observation.confidence > tally.best_confidence {
                        tally.best_confidence = observation.confidence;
                    }
                }
                None => {
                    index.insert(label, tallies.len());
                    tallies.push(Tally {
                        label,
                        occurrences: 1,
                        best_confidence: observation.confidence,
                    });
                }
            }
        }

        tallies
    }
}
