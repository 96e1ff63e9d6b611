use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use schnapsen_core::AppInfo;
use schnapsen_tracker::config::{ResolvedOutputs, TrackerConfig};
use schnapsen_tracker::logging::init_logging;
use schnapsen_tracker::runner::TrackerRunner;
use schnapsen_tracker::simulate::simulate;
use schnapsen_tracker::source::{FrameSource, JsonlFrames, ScriptedFrames};

/// Follows a Russian Schnapsen game from card-detector output.
#[derive(Debug, Parser)]
#[command(
    name = "schnapsen-tracker",
    author,
    version,
    about = "Track a game of Russian Schnapsen from card detections"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config/tracker.yaml")]
    config: PathBuf,

    /// JSON-lines detection log, one frame per line.
    #[arg(
        short,
        long,
        value_name = "FILE",
        conflicts_with = "simulate",
        required_unless_present_any = ["simulate", "validate_only"]
    )]
    detections: Option<PathBuf>,

    /// Track a synthetic deal instead of a detection log.
    #[arg(long)]
    simulate: bool,

    /// RNG seed for the synthetic deal.
    #[arg(long, value_name = "SEED", default_value_t = 0)]
    seed: u64,

    /// Card points and marriage bonuses (card_scores.json).
    #[arg(long, value_name = "FILE")]
    scores: Option<PathBuf>,

    /// Override the number of frames merged into one evidence batch.
    #[arg(long, value_name = "FRAMES")]
    merge_window: Option<usize>,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override where the event log is written.
    #[arg(long, value_name = "FILE")]
    events_out: Option<PathBuf>,

    /// Log verbosity, overriding the configured tracing level.
    #[arg(short, long, value_enum, value_name = "LEVEL")]
    verbose: Option<Verbosity>,

    /// Exit after validating the configuration (no frames are read).
    #[arg(long)]
    validate_only: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Verbosity {
    Silent,
    Info,
    Debug,
}

impl Verbosity {
    fn tracing_level(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = TrackerConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(path) = cli.scores.as_ref() {
        config.load_scores(path)?;
    }

    if let Some(frames) = cli.merge_window {
        config.merge_window = frames;
    }

    if let Some(verbosity) = cli.verbose {
        config.logging.tracing_level = verbosity.tracing_level().to_string();
    }

    config.validate()?;

    let mut outputs: ResolvedOutputs = config.resolved_outputs();
    if let Some(path) = cli.events_out {
        outputs = outputs.with_events_path(path);
    }
    let run_id = config.run_id.clone();
    let rules = &config.rules;

    println!(
        "Loaded configuration '{run_id}': {} players, {} cards, first to {} points ({}-frame window)",
        rules.no_players, rules.deck_size, rules.victory_threshold, config.merge_window
    );

    if cli.validate_only {
        println!("Validation-only mode: tracking skipped.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging, &outputs)?;

    let mut source: Box<dyn FrameSource> = match cli.detections.as_ref() {
        Some(path) => Box::new(JsonlFrames::open(path)?),
        None => {
            let game = simulate(
                &config.rules,
                &config.evidence,
                &config.bids,
                config.merge_window,
                cli.seed,
            )
            .context("rendering simulated deal")?;
            println!(
                "Simulated deal (seed {}): {} frames, {} tricks, {} marriages",
                cli.seed,
                game.frames.len(),
                game.tricks,
                game.marriages
            );
            Box::new(ScriptedFrames::new(game.frames))
        }
    };

    let runner = TrackerRunner::new(config, outputs);
    let summary = runner.run(source.as_mut())?;

    println!(
        "Tracking complete for '{run_id}': {} frames, {} ticks, {} tricks → {} events at {}",
        summary.frames_read,
        summary.ticks,
        summary.tricks_completed,
        summary.events_written,
        summary.events_path.display()
    );
    println!("Final snapshot: {}", summary.snapshot_path.display());
    if let Some(path) = logging_guard.telemetry_path.as_ref() {
        println!("Telemetry log: {}", path.display());
    }

    match summary.winner {
        Some(winner) => println!("{winner} won the game of {}!", AppInfo::game()),
        None => {
            let standings: Vec<String> = summary
                .snapshot
                .scores
                .iter()
                .enumerate()
                .map(|(seat, score)| format!("Player {seat}: {score}"))
                .collect();
            let leader = summary
                .snapshot
                .leader()
                .map_or_else(|| "nobody".to_string(), |player| player.to_string());
            println!(
                "No winner yet ({} phase, {leader} leads). Standings: {}",
                summary.snapshot.phase,
                standings.join(", ")
            );
        }
    }

    Ok(())
}
