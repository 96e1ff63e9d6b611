pub mod aggregator;
pub mod observation;

pub use aggregator::{
    ConfirmMode, EvidenceAggregator, EvidenceConfig, EvidenceError, UnknownLabelPolicy,
};
pub use observation::{DEFAULT_MERGE_WINDOW, MergeWindow, Observation};
