//! Recorded detector output as a frame source.
//!
//! A replay file holds one JSON object per line, in the detector's own
//! shape:
//!
//! ```text
//! {"hands":[{"score":0.97,"keypoints":[{"x":320,"y":420,"score":0.9}, …]}]}
//! {"hands":[]}
//! ```
//!
//! [`ReplaySource`] hands out one line per frame as the frame payload, and
//! [`ReplayDetector`] decodes that payload back into hands.  Blank lines are
//! skipped; undecodable lines surface as detector errors on their tick.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use chord_gesture::{DetectorError, DetectorLoader, Frame, FrameSource, HandDetector, RawDetection, RawHand};

use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// ReplaySource
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct ReplaySource {
    lines:    Vec<String>,
    next:     usize,
    looping:  bool,
    sequence: u64,
}

impl ReplaySource {
    pub fn open(path: &Path, looping: bool) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        let source = Self::from_text(&text, looping);
        if source.lines.is_empty() {
            return Err(AppError::Replay {
                path:   PathBuf::from(path),
                reason: "no frames".into(),
            });
        }
        info!(path = %path.display(), frames = source.lines.len(), looping, "replay opened");
        Ok(source)
    }

    pub fn from_text(text: &str, looping: bool) -> Self {
        let lines = text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        ReplaySource { lines, next: 0, looping, sequence: 0 }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FrameSource for ReplaySource {
    fn poll_frame(&mut self) -> Option<Frame> {
        if self.next >= self.lines.len() {
            if !self.looping || self.lines.is_empty() {
                return None;
            }
            debug!("replay wrapped");
            self.next = 0;
        }
        let line = &self.lines[self.next];
        self.next += 1;
        self.sequence += 1;
        Some(Frame::new(self.sequence, line.as_bytes().to_vec()))
    }

    fn is_exhausted(&self) -> bool {
        !self.looping && self.next >= self.lines.len()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayDetector
// ════════════════════════════════════════════════════════════════════════════

/// Decodes the JSON line carried in each frame.
#[derive(Debug, Default)]
pub struct ReplayDetector;

#[async_trait]
impl HandDetector for ReplayDetector {
    async fn detect(&self, frame: &Frame) -> Result<Vec<RawHand>, DetectorError> {
        let line = std::str::from_utf8(&frame.data)
            .map_err(|e| DetectorError::Decode(e.to_string()))?;
        Ok(RawDetection::from_json(line)?.hands)
    }
}

#[derive(Debug, Default)]
pub struct ReplayLoader;

#[async_trait]
impl DetectorLoader for ReplayLoader {
    async fn load(&self) -> Result<Box<dyn HandDetector>, DetectorError> {
        Ok(Box::new(ReplayDetector))
    }
}

/// Render a detection as one replay line.
pub fn encode_line(hands: &[RawHand]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&RawDetection { hands: hands.to_vec() })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
