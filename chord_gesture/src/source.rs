//! Collaborator seams: frame acquisition, hand detection, chord output.
//!
//! The pipeline only ever talks to these traits.  Camera drivers, pose
//! models and synthesisers live outside this crate.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DetectorError;
use crate::keypoint::RawHand;

// ════════════════════════════════════════════════════════════════════════════
// Frame
// ════════════════════════════════════════════════════════════════════════════

/// One captured video frame.  `data` is opaque to the pipeline; only the
/// detector interprets it.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Monotonic per-source frame counter.
    pub sequence: u64,
    pub data:     Arc<[u8]>,
}

impl Frame {
    pub fn new(sequence: u64, data: impl Into<Arc<[u8]>>) -> Self {
        Frame { sequence, data: data.into() }
    }

    /// A frame with no payload.
    pub fn blank(sequence: u64) -> Self {
        Frame::new(sequence, Vec::new())
    }
}

/// Pull-based access to the latest frame.
pub trait FrameSource: Send {
    /// The most recent ready frame, or `None` if nothing new is ready.
    /// Must not block.
    fn poll_frame(&mut self) -> Option<Frame>;

    /// True once a finite source has nothing more to give.
    fn is_exhausted(&self) -> bool { false }
}

// ════════════════════════════════════════════════════════════════════════════
// Hand detection
// ════════════════════════════════════════════════════════════════════════════

/// A loaded pose-estimation model.
#[async_trait]
pub trait HandDetector: Send + Sync {
    /// Hands found in `frame`; empty when there are none.
    async fn detect(&self, frame: &Frame) -> Result<Vec<RawHand>, DetectorError>;
}

/// Creates a [`HandDetector`]; may be slow (model download, GPU init).
#[async_trait]
pub trait DetectorLoader: Send + Sync {
    async fn load(&self) -> Result<Box<dyn HandDetector>, DetectorError>;
}

// ════════════════════════════════════════════════════════════════════════════
// Chord output
// ════════════════════════════════════════════════════════════════════════════

/// Receives chord-change events.  Fire-and-forget; unknown labels are the
/// sink's problem.
pub trait ChordSink: Send {
    fn play(&mut self, chord: &str);
}
