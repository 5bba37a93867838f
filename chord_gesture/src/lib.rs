//! # chord_gesture
//!
//! Turn hand-pose keypoints into guitar-chord events.
//!
//! Each sample, a [`HandDetector`] reports 21 landmarks per hand.  The
//! first hand is classified into five extended/curled finger flags, the
//! flags are looked up in a six-row chord table, and the result is
//! debounced so a held pose fires exactly one chord event.
//!
//! ## Pose → chord
//!
//! | Pose | Chord |
//! |---|---|
//! | index | A major |
//! | index + middle | A minor |
//! | index + middle + ring | C major |
//! | four fingers, thumb tucked | D major |
//! | open hand | G major |
//! | fist | F major |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use chord_gesture::{FingerStates, Hand, Thresholds, resolve_chord};
//!
//! fn classify(hand: &Hand) {
//!     let fingers = FingerStates::from_hand(hand, &Thresholds::default());
//!     match resolve_chord(&fingers) {
//!         Some(chord) => println!("{fingers}  → {chord}"),
//!         None        => println!("{fingers}  → (none)"),
//!     }
//! }
//! ```
//!
//! The async side ([`DetectionSession`], [`GesturePipeline`]) runs on tokio;
//! everything else is plain synchronous code.

pub mod error;
pub mod keypoint;
pub mod geometry;
pub mod finger;
pub mod chord;
pub mod debounce;
pub mod source;
pub mod session;
pub mod pipeline;
pub mod synthetic;

pub use chord::{resolve_chord, ChordLabel, UnknownChord, CHORD_TABLE};
pub use debounce::{GestureMemory, Transition};
pub use error::{DetectorError, GestureError, SessionError};
pub use finger::{is_extended, Finger, FingerStates, Thresholds};
pub use keypoint::{Hand, Keypoint, RawDetection, RawHand, RawKeypoint, HAND_KEYPOINTS};
pub use pipeline::{GesturePipeline, PipelineSnapshot, TickOutcome};
pub use session::{DetectionSession, LoadStatus, SessionState};
pub use source::{ChordSink, DetectorLoader, Frame, FrameSource, HandDetector};
