//! # air_chords
//!
//! Strum guitar chords in the air: a hand pose held in front of the camera
//! selects a chord, and every change of chord is played over MIDI.
//!
//! ## Pose → Chord mapping
//!
//! | Pose | Chord | Sim key |
//! |---|---|---|
//! | Index finger only | A major | `1` |
//! | Index + middle | A minor | `2` |
//! | Index + middle + ring | C major | `3` |
//! | Four fingers, thumb tucked | D major | `4` |
//! | Open hand | G major | `5` |
//! | Fist | F major | `6` |
//!
//! A chord plays once when it is first shown; holding it, dropping the
//! hand, or showing an unmapped pose (`0`) keeps the last chord held.
//!
//! ## Hand sources
//!
//! * `sim` (default) — **Simulation**: number keys in the window pose a
//!   synthetic hand; `H` hides it.
//! * `replay` — **Recorded**: detector output from a JSON-lines file,
//!   optionally looped.  Runs without a window via `--no-window`.
//!
//! ### Window keys
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`6` | Chord poses |
//! | `0` | Open, unmapped pose |
//! | `H` | Hide hand |
//! | `[` / `]` | Previous / next instrument |
//! | `Space` | Mute the sounding chord |
//! | `Q` / `Esc` | Quit |

pub mod error;
pub mod config;
pub mod sim;
pub mod replay;
pub mod player;
pub mod visualizer;
pub mod app;
