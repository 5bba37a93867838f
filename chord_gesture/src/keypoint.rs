//! Keypoints, hands, and the detector-output boundary schema.
//!
//! Detector output arrives as loosely-shaped [`RawHand`] records (the
//! MediaPipe-Hands layout: a list of `{x, y, score}` keypoints plus a
//! hand-level score).  [`Hand::from_raw`] is the only way across the
//! boundary; anything that is not exactly 21 keypoints is rejected there so
//! malformed data never reaches the geometry code.

use serde::{Deserialize, Serialize};

use crate::error::GestureError;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (MediaPipe hand convention)
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks in a hand.
pub const HAND_KEYPOINTS: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// Bone connections, used for drawing the skeleton.
pub const HAND_BONES: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC),   (THUMB_CMC, THUMB_MCP),   (THUMB_MCP, THUMB_IP),   (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP),   (INDEX_MCP, INDEX_PIP),   (INDEX_PIP, INDEX_DIP),  (INDEX_DIP, INDEX_TIP),
    (WRIST, MIDDLE_MCP),  (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (WRIST, RING_MCP),    (RING_MCP, RING_PIP),     (RING_PIP, RING_DIP),    (RING_DIP, RING_TIP),
    (WRIST, PINKY_MCP),   (PINKY_MCP, PINKY_PIP),   (PINKY_PIP, PINKY_DIP),  (PINKY_DIP, PINKY_TIP),
    (INDEX_MCP, MIDDLE_MCP),
];

/// Keypoints at or below this confidence are ignored.
pub const MIN_KEYPOINT_CONFIDENCE: f32 = 0.5;

// ════════════════════════════════════════════════════════════════════════════
// Keypoint
// ════════════════════════════════════════════════════════════════════════════

/// One detected landmark: pixel position plus detector confidence (0–1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x:          f32,
    pub y:          f32,
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Keypoint { x, y, confidence }
    }

    /// Finite coordinates and confidence strictly above `min_confidence`.
    pub fn is_valid(&self, min_confidence: f32) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.confidence > min_confidence
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Hand
// ════════════════════════════════════════════════════════════════════════════

/// Exactly 21 keypoints in MediaPipe order.
#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    keypoints: [Keypoint; HAND_KEYPOINTS],
}

impl Hand {
    /// Build a hand from an ordered keypoint list.
    pub fn new(keypoints: Vec<Keypoint>) -> Result<Self, GestureError> {
        let found = keypoints.len();
        let keypoints: [Keypoint; HAND_KEYPOINTS] = keypoints
            .try_into()
            .map_err(|_| GestureError::MalformedHand { expected: HAND_KEYPOINTS, found })?;
        Ok(Hand { keypoints })
    }

    pub fn from_array(keypoints: [Keypoint; HAND_KEYPOINTS]) -> Self {
        Hand { keypoints }
    }

    /// Validate and convert one detector record.
    ///
    /// Keypoints without their own score inherit the hand score; with
    /// neither they get confidence 0 and will never count as valid.
    pub fn from_raw(raw: &RawHand) -> Result<Self, GestureError> {
        let fallback = raw.score.unwrap_or(0.0);
        let keypoints = raw.keypoints.iter()
            .map(|k| Keypoint::new(k.x, k.y, k.score.unwrap_or(fallback)))
            .collect();
        Hand::new(keypoints)
    }

    pub fn keypoint(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }

    pub fn keypoints(&self) -> &[Keypoint; HAND_KEYPOINTS] {
        &self.keypoints
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Boundary schema
// ════════════════════════════════════════════════════════════════════════════

/// Keypoint as reported by a detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawKeypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default, alias = "confidence")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Hand as reported by a detector; not yet validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawHand {
    pub keypoints: Vec<RawKeypoint>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handedness: Option<String>,
}

impl From<&Hand> for RawHand {
    fn from(hand: &Hand) -> Self {
        RawHand {
            keypoints: hand.keypoints.iter()
                .map(|k| RawKeypoint { x: k.x, y: k.y, score: Some(k.confidence), name: None })
                .collect(),
            score: None,
            handedness: None,
        }
    }
}

/// One frame of detector output: zero or more hands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(default)]
    pub hands: Vec<RawHand>,
}

impl RawDetection {
    /// Parse one JSON line of detector output.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_hand(n: usize, score: Option<f32>) -> RawHand {
        RawHand {
            keypoints: (0..n)
                .map(|i| RawKeypoint { x: i as f32, y: 0.0, score, name: None })
                .collect(),
            score: None,
            handedness: None,
        }
    }

    #[test]
    fn validity_requires_confidence_above_threshold() {
        assert!(Keypoint::new(1.0, 1.0, 0.51).is_valid(MIN_KEYPOINT_CONFIDENCE));
        assert!(!Keypoint::new(1.0, 1.0, 0.5).is_valid(MIN_KEYPOINT_CONFIDENCE));
    }

    #[test]
    fn validity_rejects_non_finite_coordinates() {
        assert!(!Keypoint::new(f32::NAN, 1.0, 0.9).is_valid(MIN_KEYPOINT_CONFIDENCE));
        assert!(!Keypoint::new(1.0, f32::INFINITY, 0.9).is_valid(MIN_KEYPOINT_CONFIDENCE));
    }

    #[test]
    fn hand_requires_21_keypoints() {
        let err = Hand::new(vec![Keypoint::default(); 20]).unwrap_err();
        assert_eq!(err, GestureError::MalformedHand { expected: 21, found: 20 });
        assert!(Hand::new(vec![Keypoint::default(); 21]).is_ok());
        assert!(Hand::new(vec![Keypoint::default(); 22]).is_err());
    }

    #[test]
    fn from_raw_keeps_order() {
        let hand = Hand::from_raw(&raw_hand(21, Some(0.9))).unwrap();
        assert_eq!(hand.keypoint(PINKY_TIP).unwrap().x, 20.0);
        assert_eq!(hand.keypoint(WRIST).unwrap().confidence, 0.9);
    }

    #[test]
    fn missing_keypoint_score_inherits_hand_score() {
        let mut raw = raw_hand(21, None);
        raw.score = Some(0.8);
        let hand = Hand::from_raw(&raw).unwrap();
        assert!(hand.keypoints().iter().all(|k| k.confidence == 0.8));
    }

    #[test]
    fn missing_scores_make_keypoints_invalid() {
        let hand = Hand::from_raw(&raw_hand(21, None)).unwrap();
        assert!(hand.keypoints().iter().all(|k| !k.is_valid(MIN_KEYPOINT_CONFIDENCE)));
    }

    #[test]
    fn parses_mediapipe_shaped_json() {
        let kps: Vec<String> = (0..21)
            .map(|i| format!(r#"{{"x":{},"y":2.5,"score":0.9,"name":"k{}"}}"#, i, i))
            .collect();
        let line = format!(r#"{{"hands":[{{"keypoints":[{}],"score":0.97,"handedness":"Right"}}]}}"#,
                           kps.join(","));
        let det = RawDetection::from_json(&line).unwrap();
        assert_eq!(det.hands.len(), 1);
        assert_eq!(det.hands[0].handedness.as_deref(), Some("Right"));
        assert!(Hand::from_raw(&det.hands[0]).is_ok());
    }

    #[test]
    fn empty_detection_has_no_hands() {
        assert!(RawDetection::from_json("{}").unwrap().hands.is_empty());
    }
}
