//! Per-finger extended/flexed classification.
//!
//! Each finger owns a contiguous block of four landmarks (proximal joint →
//! tip).  A finger counts as extended only when all four landmarks are
//! valid and its geometry clears the threshold; any doubt resolves to
//! "flexed".

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::{horizontal_deviation, keypoint_joint_angle, thumb_angle};
use crate::keypoint::{Hand, Keypoint, MIN_KEYPOINT_CONFIDENCE};

// ════════════════════════════════════════════════════════════════════════════
// Thresholds
// ════════════════════════════════════════════════════════════════════════════

/// Interior angle at the mid joint above which a finger is straight (~160°).
pub const FINGER_EXTENDED_RAD: f32 = 2.79;

/// Thumb deviation from horizontal above which it is extended (~45°),
/// whichever side of the hand the thumb points to.
pub const THUMB_EXTENDED_RAD: f32 = 0.785;

/// Tunable decision constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_keypoint_confidence: f32,
    pub finger_extended_rad:     f32,
    pub thumb_extended_rad:      f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            min_keypoint_confidence: MIN_KEYPOINT_CONFIDENCE,
            finger_extended_rad:     FINGER_EXTENDED_RAD,
            thumb_extended_rad:      THUMB_EXTENDED_RAD,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky,
    ];

    /// Landmark indices, proximal joint first, tip last.
    pub fn indices(self) -> [usize; 4] {
        let start = 1 + 4 * self as usize;
        [start, start + 1, start + 2, start + 3]
    }

    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb  => "thumb",
            Finger::Index  => "index",
            Finger::Middle => "middle",
            Finger::Ring   => "ring",
            Finger::Pinky  => "pinky",
        }
    }
}

/// Classify one finger of `hand`.
pub fn is_extended(hand: &Hand, finger: Finger, thresholds: &Thresholds) -> bool {
    let idx = finger.indices();
    let mut joints = [Keypoint::default(); 4];
    for (slot, &i) in joints.iter_mut().zip(idx.iter()) {
        match hand.keypoint(i) {
            Some(k) if k.is_valid(thresholds.min_keypoint_confidence) => *slot = *k,
            _ => {
                trace!(finger = finger.name(), landmark = i, "unreliable keypoint");
                return false;
            }
        }
    }
    let [base, mid, _, tip] = joints;

    match finger {
        Finger::Thumb => {
            let angle = thumb_angle(base.position(), tip.position());
            let deviation = horizontal_deviation(angle);
            trace!(finger = finger.name(), angle, deviation, "thumb angle");
            deviation > thresholds.thumb_extended_rad
        }
        _ => match keypoint_joint_angle(&base, &mid, &tip) {
            Some(angle) => {
                trace!(finger = finger.name(), angle, "joint angle");
                angle > thresholds.finger_extended_rad
            }
            None => false,
        },
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FingerStates — the 5-boolean summary of one hand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerStates {
    pub thumb:  bool,
    pub index:  bool,
    pub middle: bool,
    pub ring:   bool,
    pub pinky:  bool,
}

impl FingerStates {
    /// Order: thumb, index, middle, ring, pinky.
    pub const fn new(thumb: bool, index: bool, middle: bool, ring: bool, pinky: bool) -> Self {
        FingerStates { thumb, index, middle, ring, pinky }
    }

    pub fn from_hand(hand: &Hand, thresholds: &Thresholds) -> Self {
        FingerStates {
            thumb:  is_extended(hand, Finger::Thumb,  thresholds),
            index:  is_extended(hand, Finger::Index,  thresholds),
            middle: is_extended(hand, Finger::Middle, thresholds),
            ring:   is_extended(hand, Finger::Ring,   thresholds),
            pinky:  is_extended(hand, Finger::Pinky,  thresholds),
        }
    }

    pub fn get(&self, finger: Finger) -> bool {
        match finger {
            Finger::Thumb  => self.thumb,
            Finger::Index  => self.index,
            Finger::Middle => self.middle,
            Finger::Ring   => self.ring,
            Finger::Pinky  => self.pinky,
        }
    }

    pub fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    pub fn extended_count(&self) -> usize {
        self.as_array().iter().filter(|&&e| e).count()
    }
}

impl fmt::Display for FingerStates {
    /// `T- I+ M+ R- P-`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marks: Vec<String> = Finger::ALL.iter()
            .map(|&fg| {
                let initial = fg.name()[..1].to_uppercase();
                format!("{}{}", initial, if self.get(fg) { '+' } else { '-' })
            })
            .collect();
        write!(f, "{}", marks.join(" "))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::HAND_KEYPOINTS;
    use crate::synthetic::synthetic_hand;

    fn t() -> Thresholds { Thresholds::default() }

    /// A hand with every landmark at the same confident point.
    fn flat_hand() -> [Keypoint; HAND_KEYPOINTS] {
        [Keypoint::new(100.0, 100.0, 0.9); HAND_KEYPOINTS]
    }

    /// Lay out the index finger: base, mid, dip, tip.
    fn with_index(points: [(f32, f32); 4]) -> Hand {
        let mut kps = flat_hand();
        for (i, &(x, y)) in Finger::Index.indices().iter().zip(points.iter()) {
            kps[*i] = Keypoint::new(x, y, 0.9);
        }
        Hand::from_array(kps)
    }

    #[test]
    fn finger_indices_follow_mediapipe_blocks() {
        assert_eq!(Finger::Thumb.indices(),  [1, 2, 3, 4]);
        assert_eq!(Finger::Index.indices(),  [5, 6, 7, 8]);
        assert_eq!(Finger::Middle.indices(), [9, 10, 11, 12]);
        assert_eq!(Finger::Ring.indices(),   [13, 14, 15, 16]);
        assert_eq!(Finger::Pinky.indices(),  [17, 18, 19, 20]);
    }

    #[test]
    fn straight_finger_is_extended() {
        let hand = with_index([(100.0, 200.0), (100.0, 160.0), (100.0, 130.0), (100.0, 100.0)]);
        assert!(is_extended(&hand, Finger::Index, &t()));
    }

    #[test]
    fn slightly_bent_finger_still_extended() {
        // tip 10° off the line
        let tip_x = 100.0 + 60.0 * 10f32.to_radians().sin();
        let tip_y = 160.0 - 60.0 * 10f32.to_radians().cos();
        let hand = with_index([(100.0, 200.0), (100.0, 160.0), (100.0, 130.0), (tip_x, tip_y)]);
        assert!(is_extended(&hand, Finger::Index, &t()));
    }

    #[test]
    fn folded_finger_is_not_extended() {
        let hand = with_index([(100.0, 200.0), (100.0, 160.0), (105.0, 175.0), (104.0, 195.0)]);
        assert!(!is_extended(&hand, Finger::Index, &t()));
    }

    #[test]
    fn right_angle_finger_is_not_extended() {
        let hand = with_index([(100.0, 200.0), (100.0, 160.0), (120.0, 160.0), (140.0, 160.0)]);
        assert!(!is_extended(&hand, Finger::Index, &t()));
    }

    #[test]
    fn degenerate_finger_is_not_extended() {
        let hand = with_index([(100.0, 160.0), (100.0, 160.0), (100.0, 130.0), (100.0, 100.0)]);
        assert!(!is_extended(&hand, Finger::Index, &t()));
    }

    #[test]
    fn any_low_confidence_keypoint_forces_flexed() {
        let straight = FingerStates::new(true, true, true, true, true);
        for finger in Finger::ALL {
            for slot in finger.indices() {
                let mut kps = *synthetic_hand(straight).keypoints();
                kps[slot].confidence = 0.2;
                let hand = Hand::from_array(kps);
                assert!(!is_extended(&hand, finger, &t()), "{} slot {}", finger.name(), slot);
            }
        }
    }

    #[test]
    fn nan_keypoint_forces_flexed() {
        let mut kps = *synthetic_hand(FingerStates::new(true, true, true, true, true)).keypoints();
        kps[Finger::Middle.indices()[3]].x = f32::NAN;
        assert!(!is_extended(&Hand::from_array(kps), Finger::Middle, &t()));
    }

    #[test]
    fn thumb_uses_horizontal_deviation() {
        let mut kps = flat_hand();
        let [b, _, _, tip] = Finger::Thumb.indices();
        kps[b]   = Keypoint::new(100.0, 200.0, 0.9);
        kps[tip] = Keypoint::new(160.0, 195.0, 0.9);
        assert!(!is_extended(&Hand::from_array(kps), Finger::Thumb, &t()));

        kps[tip] = Keypoint::new(140.0, 140.0, 0.9);
        assert!(is_extended(&Hand::from_array(kps), Finger::Thumb, &t()));
    }

    #[test]
    fn flat_thumb_is_flexed_on_either_side() {
        let mut kps = flat_hand();
        let [b, _, _, tip] = Finger::Thumb.indices();
        kps[b] = Keypoint::new(200.0, 300.0, 0.9);

        kps[tip] = Keypoint::new(140.0, 301.0, 0.9);
        assert!(!is_extended(&Hand::from_array(kps), Finger::Thumb, &t()));
        kps[tip] = Keypoint::new(260.0, 301.0, 0.9);
        assert!(!is_extended(&Hand::from_array(kps), Finger::Thumb, &t()));

        // raised up-and-left clears the threshold just like up-and-right
        kps[tip] = Keypoint::new(140.0, 230.0, 0.9);
        assert!(is_extended(&Hand::from_array(kps), Finger::Thumb, &t()));
        kps[tip] = Keypoint::new(260.0, 230.0, 0.9);
        assert!(is_extended(&Hand::from_array(kps), Finger::Thumb, &t()));
    }

    #[test]
    fn thresholds_are_recalibratable() {
        let hand = with_index([(100.0, 200.0), (100.0, 160.0), (120.0, 160.0), (140.0, 160.0)]);
        let loose = Thresholds { finger_extended_rad: 1.0, ..Thresholds::default() };
        assert!(is_extended(&hand, Finger::Index, &loose));
    }

    #[test]
    fn states_display() {
        let s = FingerStates::new(false, true, true, false, false);
        assert_eq!(s.to_string(), "T- I+ M+ R- P-");
        assert_eq!(s.extended_count(), 2);
    }
}
