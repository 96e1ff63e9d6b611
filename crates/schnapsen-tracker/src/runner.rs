use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use schnapsen_core::evidence::MergeWindow;
use schnapsen_core::{Game, GameError, GameEvent, GameSnapshot, Observation, PlayerId};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{ResolvedOutputs, TrackerConfig};
use crate::source::{FrameSource, SourceError};

/// Drives one game from a frame source to its final snapshot.
pub struct TrackerRunner {
    config: TrackerConfig,
    outputs: ResolvedOutputs,
}

/// Summary details returned after a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames_read: usize,
    pub ticks: u64,
    pub events_written: usize,
    pub tricks_completed: usize,
    pub winner: Option<PlayerId>,
    pub snapshot: GameSnapshot,
    pub events_path: PathBuf,
    pub snapshot_path: PathBuf,
}

#[derive(Serialize)]
struct EventRow<'a> {
    run_id: &'a str,
    tick: u64,
    #[serde(flatten)]
    event: &'a GameEvent,
}

impl TrackerRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: TrackerConfig, outputs: ResolvedOutputs) -> Self {
        Self { config, outputs }
    }

    /// Build a game with the configured rules and bid queues.
    pub fn new_game(&self) -> Result<Game, RunnerError> {
        let mut game = Game::new(self.config.rules.clone(), self.config.evidence.clone())
            .map_err(|source| RunnerError::Game { tick: 0, source })?;
        for (seat, queue) in self.config.bids.iter().enumerate() {
            for bid in queue {
                game.queue_bid(PlayerId::new(seat), *bid)
                    .map_err(|source| RunnerError::Game { tick: 0, source })?;
            }
        }
        Ok(game)
    }

    /// Feed every frame through the merge window into the game, streaming events to disk.
    pub fn run(&self, source: &mut dyn FrameSource) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.events_jsonl.parent())?;
        ensure_parent(self.outputs.snapshot_json.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.events_jsonl)?);
        let mut game = self.new_game()?;
        let mut window = MergeWindow::new(self.config.merge_window);
        let mut frames_read = 0usize;
        let mut events_written = 0usize;

        event!(
            target: "schnapsen_tracker::runner",
            Level::INFO,
            run_id = %self.config.run_id,
            players = self.config.rules.no_players,
            deck_size = self.config.rules.deck_size,
            merge_window = window.size(),
            "tracking started"
        );

        while let Some(frame) = source.next_frame()? {
            frames_read += 1;
            if let Some(batch) = window.push_frame(frame) {
                events_written += self.step(&mut game, &batch, &mut writer)?;
                if game.phase().is_terminal() {
                    break;
                }
            }
        }

        if !game.phase().is_terminal() {
            if let Some(batch) = window.flush() {
                events_written += self.step(&mut game, &batch, &mut writer)?;
            }
        }
        writer.flush()?;

        let snapshot = GameSnapshot::capture(&game);
        fs::write(
            &self.outputs.snapshot_json,
            serde_json::to_string_pretty(&snapshot)?,
        )?;

        event!(
            target: "schnapsen_tracker::runner",
            Level::INFO,
            run_id = %self.config.run_id,
            frames = frames_read,
            ticks = game.ticks(),
            phase = %game.phase(),
            tricks = game.tricks_completed(),
            "tracking finished"
        );

        Ok(RunSummary {
            frames_read,
            ticks: game.ticks(),
            events_written,
            tricks_completed: game.tricks_completed(),
            winner: game.winner(),
            snapshot,
            events_path: self.outputs.events_jsonl.clone(),
            snapshot_path: self.outputs.snapshot_json.clone(),
        })
    }

    fn step(
        &self,
        game: &mut Game,
        batch: &[Observation],
        writer: &mut BufWriter<File>,
    ) -> Result<usize, RunnerError> {
        let tick = game.ticks() + 1;
        let outcome = game.tick(batch);
        let written = write_events(writer, &self.config.run_id, tick, game.drain_events())?;

        if let Err(source) = outcome {
            writer.flush()?;
            event!(
                target: "schnapsen_tracker::runner",
                Level::ERROR,
                run_id = %self.config.run_id,
                tick,
                error = %source,
                "tracking aborted"
            );
            return Err(RunnerError::Game { tick, source });
        }
        Ok(written)
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_events(
    writer: &mut BufWriter<File>,
    run_id: &str,
    tick: u64,
    events: Vec<GameEvent>,
) -> Result<usize, RunnerError> {
    for event in &events {
        let row = EventRow {
            run_id,
            tick,
            event,
        };
        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
    }
    Ok(events.len())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("game stopped at tick {tick}: {source}")]
    Game {
        tick: u64,
        #[source]
        source: GameError,
    },
}
