use schnapsen_core::evidence::{DEFAULT_MERGE_WINDOW, EvidenceConfig, EvidenceError};
use schnapsen_core::model::{Rules, RulesError, ScoreTables};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root tracker configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    pub run_id: String,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default)]
    pub evidence: EvidenceConfig,
    #[serde(default = "default_merge_window")]
    pub merge_window: usize,
    /// Bid queue per seat, drained round-robin when bidding starts.
    #[serde(default)]
    pub bids: Vec<Vec<u32>>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: TrackerConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.rules.validate()?;
        self.evidence.validate()?;
        if self.merge_window == 0 {
            return Err(ValidationError::InvalidField {
                field: "merge_window".to_string(),
                message: "merge window must span at least one frame".to_string(),
            });
        }
        if self.bids.len() > self.rules.no_players {
            return Err(ValidationError::InvalidField {
                field: "bids".to_string(),
                message: format!(
                    "{} bid queues given for {} players",
                    self.bids.len(),
                    self.rules.no_players
                ),
            });
        }
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize()?;
        Ok(())
    }

    /// Replace the score tables with the contents of a `card_scores.json` file.
    pub fn load_scores(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        self.rules.scores = ScoreTables::from_json(&json).map_err(|source| ConfigError::Scores {
            source,
            path: path.to_path_buf(),
        })?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            events_jsonl: resolve_template(&self.run_id, &self.outputs.events_jsonl),
            snapshot_json: resolve_template(&self.run_id, &self.outputs.snapshot_json),
        }
    }
}

fn default_merge_window() -> usize {
    DEFAULT_MERGE_WINDOW
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputsConfig {
    pub events_jsonl: String,
    pub snapshot_json: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.events_jsonl", &self.events_jsonl),
            ("outputs.snapshot_json", &self.snapshot_json),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to human-readable output on stderr.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Write JSON telemetry next to the event log instead of printing to stderr.
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) -> Result<(), ValidationError> {
        let trimmed = self.tracing_level.trim();
        self.tracing_level = if trimmed.is_empty() {
            default_tracing_level()
        } else {
            trimmed.to_ascii_lowercase()
        };

        if !self.is_silent() && self.level().is_none() {
            return Err(ValidationError::InvalidField {
                field: "logging.tracing_level".to_string(),
                message: format!("unknown tracing level '{}'", self.tracing_level),
            });
        }
        Ok(())
    }

    /// True when logging is switched off entirely.
    pub fn is_silent(&self) -> bool {
        matches!(
            self.tracing_level.to_ascii_lowercase().as_str(),
            "off" | "silent"
        )
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub events_jsonl: PathBuf,
    pub snapshot_json: PathBuf,
}

impl ResolvedOutputs {
    /// Replaces the event log location, keeping the path exactly as given.
    pub fn with_events_path(mut self, path: PathBuf) -> Self {
        self.events_jsonl = path;
        self
    }

    /// Directory that receives the telemetry log when structured logging is on.
    pub fn telemetry_dir(&self) -> PathBuf {
        self.events_jsonl
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("failed to parse score tables {path:?}: {source}")]
    Scores {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Scores { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
    #[error("rules: {0}")]
    Rules(#[from] RulesError),
    #[error("evidence: {0}")]
    Evidence(#[from] EvidenceError),
}
