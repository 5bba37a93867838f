//! Finger extension angles from landmark positions.
//!
//! Uses dot product formula: cos(θ) = (v1 · v2) / (|v1| × |v2|)

use std::f32::consts::PI;

use tracing::trace;

use crate::keypoint::Keypoint;

/// Vectors shorter than this are treated as coincident points.
const MIN_SEGMENT_LEN: f32 = 1e-4;

/// Interior angle at `mid`, in radians (0–π).
///
/// π means base, mid and tip are collinear (straight finger); 0 means the
/// tip is folded back onto the base.  Returns `None` when either segment
/// has zero length.
pub fn joint_angle(base: (f32, f32), mid: (f32, f32), tip: (f32, f32)) -> Option<f32> {
    // mid → base
    let a = (base.0 - mid.0, base.1 - mid.1);
    // mid → tip
    let b = (tip.0 - mid.0, tip.1 - mid.1);

    let mag_a = (a.0 * a.0 + a.1 * a.1).sqrt();
    let mag_b = (b.0 * b.0 + b.1 * b.1).sqrt();
    if !(mag_a >= MIN_SEGMENT_LEN && mag_b >= MIN_SEGMENT_LEN) {
        trace!(mag_a, mag_b, "degenerate joint geometry");
        return None;
    }

    let cos = ((a.0 * b.0 + a.1 * b.1) / (mag_a * mag_b)).clamp(-1.0, 1.0);
    Some(cos.acos())
}

/// Thumb direction from base to tip, relative to the +x axis (−π–π).
pub fn thumb_angle(base: (f32, f32), tip: (f32, f32)) -> f32 {
    (tip.1 - base.1).atan2(tip.0 - base.0)
}

/// Unsigned deviation of a [`thumb_angle`] from the horizontal axis (0–π/2),
/// the same for a thumb pointing left or right.
pub fn horizontal_deviation(angle: f32) -> f32 {
    let a = angle.abs();
    a.min(PI - a)
}

/// [`joint_angle`] over keypoints.
pub fn keypoint_joint_angle(base: &Keypoint, mid: &Keypoint, tip: &Keypoint) -> Option<f32> {
    joint_angle(base.position(), mid.position(), tip.position())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn straight_line_is_pi() {
        let angle = joint_angle((0.0, 0.0), (0.0, -10.0), (0.0, -20.0)).unwrap();
        assert!((angle - PI).abs() < 1e-4);
    }

    #[test]
    fn right_angle() {
        let angle = joint_angle((0.0, 0.0), (10.0, 0.0), (10.0, 10.0)).unwrap();
        assert!((angle - FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn folded_back_is_near_zero() {
        let angle = joint_angle((0.0, 0.0), (0.0, -10.0), (0.5, -1.0)).unwrap();
        assert!(angle < 0.1);
    }

    #[test]
    fn coincident_points_fail() {
        assert_eq!(joint_angle((1.0, 1.0), (1.0, 1.0), (5.0, 5.0)), None);
        assert_eq!(joint_angle((0.0, 0.0), (3.0, 3.0), (3.0, 3.0)), None);
    }

    #[test]
    fn nan_input_fails() {
        assert_eq!(joint_angle((f32::NAN, 0.0), (0.0, 0.0), (1.0, 0.0)), None);
    }

    #[test]
    fn thumb_angle_quadrants() {
        assert!(thumb_angle((0.0, 0.0), (10.0, 0.0)).abs() < 1e-6);
        // image y grows downward: up-and-out is a negative angle
        let up_right = thumb_angle((0.0, 0.0), (10.0, -10.0));
        assert!((up_right + PI / 4.0).abs() < 1e-4);
        assert!((thumb_angle((0.0, 0.0), (-10.0, 0.0)).abs() - PI).abs() < 1e-4);
    }

    #[test]
    fn horizontal_deviation_is_mirror_symmetric() {
        let right = horizontal_deviation(thumb_angle((200.0, 300.0), (260.0, 301.0)));
        let left  = horizontal_deviation(thumb_angle((200.0, 300.0), (140.0, 301.0)));
        assert!(right < 0.02);
        assert!((right - left).abs() < 1e-5);
        assert!((horizontal_deviation(-PI / 2.0) - PI / 2.0).abs() < 1e-6);
        assert!((horizontal_deviation(-3.0 * PI / 4.0) - PI / 4.0).abs() < 1e-5);
    }
}
