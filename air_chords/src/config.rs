//! TOML configuration.
//!
//! ```toml
//! [pipeline]
//! tick_ms = 100
//! min_keypoint_confidence = 0.5
//! finger_extended_rad = 2.79
//! thumb_extended_rad = 0.785
//!
//! [source]
//! kind = "sim"            # or "replay"
//! replay_path = "take1.jsonl"
//! replay_loop = false
//!
//! [midi]
//! instrument = "acoustic_guitar_steel"   # or a program number
//! velocity = 100
//! channel = 0
//! sustain_ms = 1800
//! port_hint = "fluid"
//! ```
//!
//! Every key is optional; missing keys take the defaults above.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use chord_gesture::Thresholds;

use crate::error::AppError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub source:   SourceConfig,
    pub midi:     MidiConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sampling period.
    pub tick_ms: u64,
    #[serde(flatten)]
    pub thresholds: Thresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig { tick_ms: 100, thresholds: Thresholds::default() }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Keyboard-driven synthetic hand.
    #[default]
    Sim,
    /// Recorded detector output, one JSON object per line.
    Replay,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_path: Option<PathBuf>,
    pub replay_loop: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// General MIDI instrument key or program number.
    pub instrument: String,
    pub velocity:   u8,
    pub channel:    u8,
    /// A chord is released this long after it starts, unless replaced sooner.
    pub sustain_ms: u64,
    /// Preferred output port (case-insensitive substring).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_hint:  Option<String>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig {
            instrument: "acoustic_guitar_steel".to_string(),
            velocity:   100,
            channel:    0,
            sustain_ms: 1800,
            port_hint:  None,
        }
    }
}

impl Config {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        let cfg: Config = toml::from_str(&text)
            .map_err(|source| AppError::ParseConfig { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String, AppError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let p = &self.pipeline;
        if !(10..=2000).contains(&p.tick_ms) {
            return Err(AppError::Config(format!("pipeline.tick_ms must be 10–2000, got {}", p.tick_ms)));
        }
        let t = &p.thresholds;
        if !(0.0..1.0).contains(&t.min_keypoint_confidence) {
            return Err(AppError::Config(format!(
                "pipeline.min_keypoint_confidence must be in [0, 1), got {}", t.min_keypoint_confidence
            )));
        }
        if !(0.0..=std::f32::consts::PI).contains(&t.finger_extended_rad) {
            return Err(AppError::Config(format!(
                "pipeline.finger_extended_rad must be in [0, π], got {}", t.finger_extended_rad
            )));
        }
        if !(0.0..=std::f32::consts::PI).contains(&t.thumb_extended_rad) {
            return Err(AppError::Config(format!(
                "pipeline.thumb_extended_rad must be in [0, π], got {}", t.thumb_extended_rad
            )));
        }

        if self.source.kind == SourceKind::Replay && self.source.replay_path.is_none() {
            return Err(AppError::Config("source.kind = \"replay\" needs source.replay_path".into()));
        }

        let m = &self.midi;
        self.program()?;
        if m.velocity > 127 {
            return Err(AppError::Config(format!("midi.velocity must be 0–127, got {}", m.velocity)));
        }
        if m.channel > 15 {
            return Err(AppError::Config(format!("midi.channel must be 0–15, got {}", m.channel)));
        }
        if m.sustain_ms == 0 {
            return Err(AppError::Config("midi.sustain_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.pipeline.tick_ms)
    }

    pub fn thresholds(&self) -> Thresholds {
        self.pipeline.thresholds
    }

    /// MIDI program number for `midi.instrument`.
    pub fn program(&self) -> Result<u8, AppError> {
        chord_midi::parse_program(&self.midi.instrument)
            .map_err(|e| AppError::Config(format!("midi.instrument: {e}")))
    }

    /// Switch to replaying `path`.
    pub fn use_replay(&mut self, path: PathBuf) {
        self.source.kind = SourceKind::Replay;
        self.source.replay_path = Some(path);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
