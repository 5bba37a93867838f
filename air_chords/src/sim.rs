//! Keyboard-driven hand simulation.
//!
//! The visualizer turns key presses into [`SimInput`] events; a translator
//! thread folds them into a shared [`SimPose`].  [`SimCamera`] produces a
//! fresh (empty) frame every poll and [`SimDetector`] answers each frame
//! with a synthetic hand in the current pose, so the whole gesture
//! pipeline runs exactly as it would on camera input.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use chord_gesture::synthetic::synthetic_hand_at;
use chord_gesture::{
    ChordLabel, DetectorError, DetectorLoader, FingerStates, Frame, FrameSource, HandDetector,
    RawHand,
};

/// Frame size the synthetic hand is drawn for.
pub const SIM_FRAME_W: u32 = 640;
pub const SIM_FRAME_H: u32 = 480;

// ════════════════════════════════════════════════════════════════════════════
// Input events
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    KeyDown(SimKey),
}

/// Simulated key codes (mapped from minifb keys).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    /// 1–6: the six chord poses.
    Chord(ChordLabel),
    /// 0: thumb and pinky out, which matches no chord.
    OpenUnmatched,
    /// H: take the hand out of view.
    Hide,
    /// Q
    Quit,
}

impl SimKey {
    /// Digit key → simulated key.
    pub fn from_digit(d: u8) -> Option<SimKey> {
        match d {
            0 => Some(SimKey::OpenUnmatched),
            1..=6 => Some(SimKey::Chord(ChordLabel::ALL[(d - 1) as usize])),
            _ => None,
        }
    }
}

/// Unmapped pose shown by key 0.
pub const UNMATCHED_POSE: FingerStates = FingerStates::new(true, false, false, false, true);

// ════════════════════════════════════════════════════════════════════════════
// SimPose — what the simulated camera currently sees
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoseState {
    /// `None` while the hand is hidden.
    pub fingers: Option<FingerStates>,
    /// Set once Q has been pressed.
    pub quit:    bool,
}

/// Shared, thread-safe current pose.
#[derive(Clone, Debug)]
pub struct SimPose(Arc<Mutex<PoseState>>);

impl Default for SimPose {
    fn default() -> Self {
        SimPose::new(None)
    }
}

impl SimPose {
    pub fn new(fingers: Option<FingerStates>) -> Self {
        SimPose(Arc::new(Mutex::new(PoseState { fingers, quit: false })))
    }

    pub fn get(&self) -> PoseState {
        *self.0.lock()
    }

    pub fn set(&self, fingers: Option<FingerStates>) {
        self.0.lock().fingers = fingers;
    }

    /// Fold one input event into the pose.
    pub fn apply(&self, input: &SimInput) {
        let mut state = self.0.lock();
        match input {
            SimInput::KeyDown(SimKey::Chord(label)) => {
                debug!(chord = %label, "sim pose");
                state.fingers = Some(label.pose());
            }
            SimInput::KeyDown(SimKey::OpenUnmatched) => state.fingers = Some(UNMATCHED_POSE),
            SimInput::KeyDown(SimKey::Hide)          => state.fingers = None,
            SimInput::KeyDown(SimKey::Quit)          => state.quit = true,
        }
    }
}

/// Spawn the translator thread: drains `SimInput`s into `pose` until the
/// sender side is dropped or Q is seen.
pub fn spawn_sim_input(pose: SimPose) -> (Sender<SimInput>, thread::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || translate(rx, pose));
    (tx, handle)
}

fn translate(rx: Receiver<SimInput>, pose: SimPose) {
    for input in rx {
        pose.apply(&input);
        if pose.get().quit {
            info!("quit requested");
            return;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimCamera
// ════════════════════════════════════════════════════════════════════════════

/// Always has a new frame.
#[derive(Debug, Default)]
pub struct SimCamera {
    sequence: u64,
}

impl FrameSource for SimCamera {
    fn poll_frame(&mut self) -> Option<Frame> {
        self.sequence += 1;
        Some(Frame::blank(self.sequence))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimDetector / SimLoader
// ════════════════════════════════════════════════════════════════════════════

pub struct SimDetector {
    pose: SimPose,
}

impl SimDetector {
    /// Small per-frame drift so the skeleton looks alive; classification
    /// does not depend on position.
    fn sway(sequence: u64) -> (f32, f32) {
        let phase = sequence as f32 * 0.15;
        (phase.sin() * 6.0, (phase * 0.7).cos() * 4.0)
    }
}

#[async_trait]
impl HandDetector for SimDetector {
    async fn detect(&self, frame: &Frame) -> Result<Vec<RawHand>, DetectorError> {
        Ok(match self.pose.get().fingers {
            Some(states) => {
                let hand = synthetic_hand_at(states, Self::sway(frame.sequence));
                vec![RawHand::from(&hand)]
            }
            None => Vec::new(),
        })
    }
}

/// Stands in for a model download: waits `delay`, then hands out a
/// [`SimDetector`].
pub struct SimLoader {
    pose:  SimPose,
    delay: Duration,
}

impl SimLoader {
    pub fn new(pose: SimPose, delay: Duration) -> Self {
        SimLoader { pose, delay }
    }
}

#[async_trait]
impl DetectorLoader for SimLoader {
    async fn load(&self) -> Result<Box<dyn HandDetector>, DetectorError> {
        tokio::time::sleep(self.delay).await;
        Ok(Box::new(SimDetector { pose: self.pose.clone() }))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use chord_gesture::{resolve_chord, Hand, Thresholds};

    fn classify(raw: &RawHand) -> Option<ChordLabel> {
        let hand = Hand::from_raw(raw).unwrap();
        resolve_chord(&FingerStates::from_hand(&hand, &Thresholds::default()))
    }

    #[test]
    fn digit_keys() {
        assert_eq!(SimKey::from_digit(1), Some(SimKey::Chord(ChordLabel::AMajor)));
        assert_eq!(SimKey::from_digit(6), Some(SimKey::Chord(ChordLabel::FMajor)));
        assert_eq!(SimKey::from_digit(0), Some(SimKey::OpenUnmatched));
        assert_eq!(SimKey::from_digit(7), None);
    }

    #[test]
    fn unmatched_pose_really_is_unmatched() {
        assert_eq!(resolve_chord(&UNMATCHED_POSE), None);
    }

    #[test]
    fn apply_updates_pose() {
        let pose = SimPose::default();
        pose.apply(&SimInput::KeyDown(SimKey::Chord(ChordLabel::CMajor)));
        assert_eq!(pose.get().fingers, Some(ChordLabel::CMajor.pose()));
        pose.apply(&SimInput::KeyDown(SimKey::Hide));
        assert_eq!(pose.get().fingers, None);
        assert!(!pose.get().quit);
        pose.apply(&SimInput::KeyDown(SimKey::Quit));
        assert!(pose.get().quit);
    }

    #[test]
    fn translator_stops_on_quit() {
        let pose = SimPose::default();
        let (tx, handle) = spawn_sim_input(pose.clone());
        tx.send(SimInput::KeyDown(SimKey::Chord(ChordLabel::GMajor))).unwrap();
        tx.send(SimInput::KeyDown(SimKey::Quit)).unwrap();
        handle.join().unwrap();
        assert_eq!(pose.get().fingers, Some(ChordLabel::GMajor.pose()));
        assert!(pose.get().quit);
    }

    #[test]
    fn camera_sequence_advances() {
        let mut cam = SimCamera::default();
        let a = cam.poll_frame().unwrap();
        let b = cam.poll_frame().unwrap();
        assert!(b.sequence > a.sequence);
        assert!(!cam.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn detector_follows_pose() {
        let pose = SimPose::new(Some(ChordLabel::DMajor.pose()));
        let detector = SimLoader::new(pose.clone(), Duration::from_millis(500)).load().await.unwrap();

        for seq in 0..20 {
            let hands = detector.detect(&Frame::blank(seq)).await.unwrap();
            assert_eq!(hands.len(), 1);
            assert_eq!(classify(&hands[0]), Some(ChordLabel::DMajor));
        }

        pose.set(None);
        let hands = detector.detect(&Frame::blank(99)).await.unwrap();
        assert!(hands.is_empty());
    }
}
