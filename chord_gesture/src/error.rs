//! Error types for the gesture pipeline.
//!
//! Most per-frame problems are not errors at all (no hand, unmatched pose);
//! these types cover the few conditions that cross an API boundary.

use thiserror::Error;

/// Landmark data that cannot be turned into a [`Hand`](crate::Hand).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GestureError {
    /// The detector returned a landmark set of the wrong size.
    #[error("malformed hand: expected {expected} keypoints, found {found}")]
    MalformedHand { expected: usize, found: usize },
}

/// Failures reported by a hand detector or its loader.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    /// The model is not loaded (or failed to load).
    #[error("hand detector unavailable")]
    Unavailable,

    /// The model could not be created.
    #[error("failed to load hand detector: {0}")]
    Load(String),

    /// A single inference call failed.
    #[error("hand detection failed: {0}")]
    Inference(String),

    /// Detector output could not be decoded.
    #[error("could not decode detector output: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for DetectorError {
    fn from(e: serde_json::Error) -> Self {
        DetectorError::Decode(e.to_string())
    }
}

/// Errors surfaced by [`DetectionSession`](crate::DetectionSession).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] DetectorError),
}
