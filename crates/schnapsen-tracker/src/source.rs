//! Frame sources feeding detector output into the tracker.
//!
//! A frame is everything the detector reported for one camera image. On disk a
//! detection log holds one JSON array per line:
//!
//! ```text
//! [{"name": "QH", "confidence": 0.91}, {"name": "KH", "confidence": 0.88}]
//! []
//! ```
//!
//! Extra columns such as bounding boxes are ignored. Blank lines are skipped;
//! an empty frame is written as `[]`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use schnapsen_core::Observation;
use thiserror::Error;

pub trait FrameSource {
    /// Next frame of detections, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Vec<Observation>>, SourceError>;
}

/// Reads frames from a JSON-lines detection log.
pub struct JsonlFrames<R> {
    reader: R,
    line: usize,
    buffer: String,
}

impl JsonlFrames<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Open {
            source,
            path: path.to_path_buf(),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonlFrames<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> FrameSource for JsonlFrames<R> {
    fn next_frame(&mut self) -> Result<Option<Vec<Observation>>, SourceError> {
        loop {
            self.buffer.clear();
            self.line += 1;
            let read = self
                .reader
                .read_line(&mut self.buffer)
                .map_err(|source| SourceError::Read {
                    source,
                    line: self.line,
                })?;
            if read == 0 {
                return Ok(None);
            }

            let text = self.buffer.trim();
            if text.is_empty() {
                continue;
            }

            let frame = serde_json::from_str(text).map_err(|source| SourceError::Parse {
                source,
                line: self.line,
            })?;
            return Ok(Some(frame));
        }
    }
}

/// Frames prepared in memory, e.g. by the simulator.
pub struct ScriptedFrames {
    frames: std::vec::IntoIter<Vec<Observation>>,
}

impl ScriptedFrames {
    pub fn new(frames: Vec<Vec<Observation>>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for ScriptedFrames {
    fn next_frame(&mut self) -> Result<Option<Vec<Observation>>, SourceError> {
        Ok(self.frames.next())
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open detections {path:?}: {source}")]
    Open {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to read detections at line {line}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        line: usize,
    },
    #[error("malformed detections at line {line}: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        line: usize,
    },
}
