use serde::{Deserialize, Serialize};
use std::mem;

pub const DEFAULT_MERGE_WINDOW: usize = 10;

/// One candidate label reported by the detector for a single frame.
///
/// Detector rows carry more columns (box corners, class id); only the label
/// and its confidence are kept. The label is read from either `label` or the
/// detector's own `name` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(alias = "name")]
    pub label: String,
    pub confidence: f32,
}

impl Observation {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Collects per-frame detections into one evidence batch every `size` frames.
#[derive(Debug, Clone)]
pub struct MergeWindow {
    size: usize,
    frames: usize,
    buffer: Vec<Observation>,
}

impl MergeWindow {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            frames: 0,
            buffer: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Adds one frame; yields the merged batch once the window is full.
    pub fn push_frame<I>(&mut self, frame: I) -> Option<Vec<Observation>>
    where
        I: IntoIterator<Item = Observation>,
    {
        self.buffer.extend(frame);
        self.frames += 1;
        if self.frames < self.size {
            return None;
        }
        self.frames = 0;
        Some(mem::take(&mut self.buffer))
    }

    /// Emits whatever a partially filled window holds at the end of the stream.
    pub fn flush(&mut self) -> Option<Vec<Observation>> {
        if self.frames == 0 {
            return None;
        }
        self.frames = 0;
        Some(mem::take(&mut self.buffer))
    }
}

impl Default for MergeWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::{MergeWindow, Observation};

    #[test]
    fn emits_batch_after_window_fills() {
        let mut window = MergeWindow::new(3);
        assert!(window.push_frame([Observation::new("QH", 0.9)]).is_none());
        assert!(window.push_frame(Vec::new()).is_none());
        let batch = window
            .push_frame([Observation::new("QH", 0.8), Observation::new("9S", 0.4)])
            .expect("third frame closes the window");
        assert_eq!(batch.len(), 3);
        assert!(window.flush().is_none());
    }

    #[test]
    fn empty_frames_still_advance_the_window() {
        let mut window = MergeWindow::new(2);
        assert!(window.push_frame(Vec::new()).is_none());
        assert_eq!(window.push_frame(Vec::new()), Some(Vec::new()));
    }

    #[test]
    fn flush_returns_partial_window() {
        let mut window = MergeWindow::new(10);
        window.push_frame([Observation::new("AC", 0.7)]);
        assert_eq!(window.flush(), Some(vec![Observation::new("AC", 0.7)]));
        assert!(window.flush().is_none());
    }

    #[test]
    fn reads_detector_name_column() {
        let row = r#"{"xmin": 1.0, "ymin": 2.0, "class": 7, "name": "10S", "confidence": 0.5}"#;
        let observation: Observation = serde_json::from_str(row).unwrap();
        assert_eq!(observation, Observation::new("10S", 0.5));
    }
}
