//! Synthetic hands for a requested finger pose.
//!
//! Builds a 21-landmark upright hand (image coordinates, y down, 640×480
//! frame) whose geometry classifies back to the requested
//! [`FingerStates`].  Used by the simulated detector and by tests.

use crate::finger::{Finger, FingerStates};
use crate::keypoint::{Hand, Keypoint, HAND_KEYPOINTS, WRIST};

const CONFIDENCE: f32 = 0.95;

const WRIST_POS: (f32, f32) = (320.0, 420.0);
const THUMB_BASE: (f32, f32) = (268.0, 392.0);

/// MCP x positions for index, middle, ring, pinky.
const KNUCKLE_X: [f32; 4] = [282.0, 316.0, 350.0, 382.0];
const KNUCKLE_Y: f32 = 320.0;

/// Joint offsets from the knuckle (mid, dip, tip).
const STRAIGHT: [(f32, f32); 3] = [(0.0, -38.0), (0.0, -68.0), (0.0, -92.0)];
const CURLED:   [(f32, f32); 3] = [(0.0, -38.0), (9.0, -24.0), (7.0, -6.0)];

/// Thumb joint offsets from its base (mcp, ip, tip).
const THUMB_OUT:    [(f32, f32); 3] = [(-24.0, -26.0), (-44.0, -50.0), (-60.0, -72.0)];
const THUMB_TUCKED: [(f32, f32); 3] = [(20.0, -4.0), (40.0, -8.0), (60.0, -12.0)];

/// Build a hand showing `states`.
pub fn synthetic_hand(states: FingerStates) -> Hand {
    synthetic_hand_at(states, (0.0, 0.0))
}

/// As [`synthetic_hand`], translated by `offset` pixels.
pub fn synthetic_hand_at(states: FingerStates, offset: (f32, f32)) -> Hand {
    let mut kps = [Keypoint::default(); HAND_KEYPOINTS];
    let at = |(x, y): (f32, f32)| Keypoint::new(x + offset.0, y + offset.1, CONFIDENCE);

    kps[WRIST] = at(WRIST_POS);

    for finger in Finger::ALL {
        let idx = finger.indices();
        let (base, joints) = match finger {
            Finger::Thumb => (
                THUMB_BASE,
                if states.thumb { THUMB_OUT } else { THUMB_TUCKED },
            ),
            _ => (
                (KNUCKLE_X[finger as usize - 1], KNUCKLE_Y),
                if states.get(finger) { STRAIGHT } else { CURLED },
            ),
        };
        kps[idx[0]] = at(base);
        for (slot, (dx, dy)) in idx[1..].iter().zip(joints.iter()) {
            kps[*slot] = at((base.0 + dx, base.1 + dy));
        }
    }

    Hand::from_array(kps)
}
