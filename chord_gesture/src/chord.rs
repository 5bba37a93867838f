//! Finger pose → chord label.
//!
//! A sparse lookup over the 32 possible finger vectors: six exact patterns
//! map to chords, everything else is silence.
//!
//! | thumb | index | middle | ring | pinky | chord |
//! |---|---|---|---|---|---|
//! | – | + | – | – | – | A major |
//! | – | + | + | – | – | A minor |
//! | – | + | + | + | – | C major |
//! | – | + | + | + | + | D major |
//! | + | + | + | + | + | G major |
//! | – | – | – | – | – | F major (fist) |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::finger::FingerStates;

// ════════════════════════════════════════════════════════════════════════════
// ChordLabel
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordLabel {
    #[serde(rename = "A_major")]
    AMajor,
    #[serde(rename = "A_minor")]
    AMinor,
    #[serde(rename = "C_major")]
    CMajor,
    #[serde(rename = "D_major")]
    DMajor,
    #[serde(rename = "G_major")]
    GMajor,
    #[serde(rename = "F_major")]
    FMajor,
}

impl ChordLabel {
    pub const ALL: [ChordLabel; 6] = [
        ChordLabel::AMajor, ChordLabel::AMinor, ChordLabel::CMajor,
        ChordLabel::DMajor, ChordLabel::GMajor, ChordLabel::FMajor,
    ];

    /// Identifier handed to the playback side, e.g. `"A_minor"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ChordLabel::AMajor => "A_major",
            ChordLabel::AMinor => "A_minor",
            ChordLabel::CMajor => "C_major",
            ChordLabel::DMajor => "D_major",
            ChordLabel::GMajor => "G_major",
            ChordLabel::FMajor => "F_major",
        }
    }

    /// Short display name, e.g. `"Am"`.
    pub fn symbol(self) -> &'static str {
        match self {
            ChordLabel::AMajor => "A",
            ChordLabel::AMinor => "Am",
            ChordLabel::CMajor => "C",
            ChordLabel::DMajor => "D",
            ChordLabel::GMajor => "G",
            ChordLabel::FMajor => "F",
        }
    }

    /// The finger pose that selects this chord.
    pub fn pose(self) -> FingerStates {
        CHORD_TABLE.iter()
            .find(|(_, label)| *label == self)
            .map(|(pose, _)| *pose)
            .unwrap_or_default()
    }
}

impl fmt::Display for ChordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown chord identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chord label: {0}")]
pub struct UnknownChord(pub String);

impl FromStr for ChordLabel {
    type Err = UnknownChord;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChordLabel::ALL.iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownChord(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Rule table
// ════════════════════════════════════════════════════════════════════════════

/// Ordered rules; first exact match wins.
pub const CHORD_TABLE: [(FingerStates, ChordLabel); 6] = [
    (FingerStates::new(false, true,  false, false, false), ChordLabel::AMajor),
    (FingerStates::new(false, true,  true,  false, false), ChordLabel::AMinor),
    (FingerStates::new(false, true,  true,  true,  false), ChordLabel::CMajor),
    (FingerStates::new(false, true,  true,  true,  true ), ChordLabel::DMajor),
    (FingerStates::new(true,  true,  true,  true,  true ), ChordLabel::GMajor),
    (FingerStates::new(false, false, false, false, false), ChordLabel::FMajor),
];

/// Resolve a finger pose to a chord, or `None` for unmapped poses.
pub fn resolve_chord(states: &FingerStates) -> Option<ChordLabel> {
    CHORD_TABLE.iter()
        .find(|(pose, _)| pose == states)
        .map(|(_, label)| *label)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_vectors() -> impl Iterator<Item = FingerStates> {
        (0u8..32).map(|b| FingerStates::new(
            b & 1 != 0, b & 2 != 0, b & 4 != 0, b & 8 != 0, b & 16 != 0,
        ))
    }

    #[test]
    fn index_only_is_a_major() {
        let s = FingerStates::new(false, true, false, false, false);
        assert_eq!(resolve_chord(&s), Some(ChordLabel::AMajor));
    }

    #[test]
    fn index_middle_is_a_minor() {
        let s = FingerStates::new(false, true, true, false, false);
        assert_eq!(resolve_chord(&s), Some(ChordLabel::AMinor));
    }

    #[test]
    fn three_fingers_is_c_major() {
        let s = FingerStates::new(false, true, true, true, false);
        assert_eq!(resolve_chord(&s), Some(ChordLabel::CMajor));
    }

    #[test]
    fn four_fingers_no_thumb_is_d_major() {
        let s = FingerStates::new(false, true, true, true, true);
        assert_eq!(resolve_chord(&s), Some(ChordLabel::DMajor));
    }

    #[test]
    fn open_hand_is_g_major() {
        let s = FingerStates::new(true, true, true, true, true);
        assert_eq!(resolve_chord(&s), Some(ChordLabel::GMajor));
    }

    #[test]
    fn fist_is_f_major() {
        assert_eq!(resolve_chord(&FingerStates::default()), Some(ChordLabel::FMajor));
    }

    #[test]
    fn thumb_with_index_is_unmapped() {
        let s = FingerStates::new(true, true, false, false, false);
        assert_eq!(resolve_chord(&s), None);
    }

    #[test]
    fn exactly_six_of_32_vectors_match() {
        let matched: Vec<_> = all_vectors().filter_map(|s| resolve_chord(&s)).collect();
        assert_eq!(matched.len(), 6);
        let distinct: HashSet<_> = matched.into_iter().collect();
        assert_eq!(distinct.len(), 6);
    }

    #[test]
    fn table_rows_are_distinct() {
        let rows: HashSet<_> = CHORD_TABLE.iter().map(|(p, _)| *p).collect();
        assert_eq!(rows.len(), CHORD_TABLE.len());
    }

    #[test]
    fn resolution_is_deterministic() {
        for s in all_vectors() {
            assert_eq!(resolve_chord(&s), resolve_chord(&s));
        }
    }

    #[test]
    fn pose_resolves_back_to_label() {
        for label in ChordLabel::ALL {
            assert_eq!(resolve_chord(&label.pose()), Some(label));
        }
    }

    #[test]
    fn label_strings() {
        assert_eq!(ChordLabel::AMinor.as_str(), "A_minor");
        assert_eq!("G_major".parse::<ChordLabel>(), Ok(ChordLabel::GMajor));
        assert!("B_flat".parse::<ChordLabel>().is_err());
        assert_eq!(serde_json::to_string(&ChordLabel::DMajor).unwrap(), "\"D_major\"");
    }
}
