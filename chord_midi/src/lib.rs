//! # chord_midi
//!
//! Chord labels → MIDI notes, plus the three channel messages needed to
//! play them.
//!
//! * [`voicing_for`] resolves a chord identifier (`"A_minor"`, …) to a
//!   root-position triad.
//! * [`GeneralMidi`] names the instruments worth strumming a chord on.
//! * [`note_on`], [`note_off`], [`program_change`] build raw message bytes.
//!
//! No external crates are required for the bytes themselves; the port is
//! somebody else's problem.
//!
//! ## Quick start
//!
//! ```rust
//! use chord_midi::{voicing_for, note_on};
//!
//! let v = voicing_for("A_minor").unwrap();
//! assert_eq!(v.notes(), [57, 60, 64]);          // A3 C4 E4
//! let msgs: Vec<[u8; 3]> = v.notes().iter().map(|&n| note_on(0, n, 96)).collect();
//! assert_eq!(msgs[0], [0x90, 57, 96]);
//! ```

use std::fmt;
use std::str::FromStr;

// ════════════════════════════════════════════════════════════════════════════
// General MIDI instrument numbers
// ════════════════════════════════════════════════════════════════════════════

/// General MIDI instruments (0-indexed program numbers, as sent in Program
/// Change).  Only the ones that suit sustained chords are named here; any
/// other program can still be given by number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GeneralMidi {
    AcousticGrandPiano   = 0,
    ElectricPiano1       = 4,
    Harpsichord          = 6,
    Vibraphone           = 11,
    DrawbarOrgan         = 16,
    ChurchOrgan          = 19,
    Accordion            = 21,
    AcousticGuitarNylon  = 24,
    AcousticGuitarSteel  = 25,
    ElectricGuitarJazz   = 26,
    ElectricGuitarClean  = 27,
    OverdrivenGuitar     = 29,
    DistortionGuitar     = 30,
    StringEnsemble1      = 48,
    ChoirAahs            = 52,
    Pad1NewAge           = 88,
    Pad2Warm             = 89,
    Banjo                = 105,
}

impl GeneralMidi {
    pub const ALL: [GeneralMidi; 18] = [
        GeneralMidi::AcousticGrandPiano, GeneralMidi::ElectricPiano1,
        GeneralMidi::Harpsichord,        GeneralMidi::Vibraphone,
        GeneralMidi::DrawbarOrgan,       GeneralMidi::ChurchOrgan,
        GeneralMidi::Accordion,          GeneralMidi::AcousticGuitarNylon,
        GeneralMidi::AcousticGuitarSteel, GeneralMidi::ElectricGuitarJazz,
        GeneralMidi::ElectricGuitarClean, GeneralMidi::OverdrivenGuitar,
        GeneralMidi::DistortionGuitar,   GeneralMidi::StringEnsemble1,
        GeneralMidi::ChoirAahs,          GeneralMidi::Pad1NewAge,
        GeneralMidi::Pad2Warm,           GeneralMidi::Banjo,
    ];

    /// Raw MIDI program number (0–127).
    pub fn program(self) -> u8 { self as u8 }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            GeneralMidi::AcousticGrandPiano  => "Acoustic Grand Piano",
            GeneralMidi::ElectricPiano1      => "Electric Piano 1",
            GeneralMidi::Harpsichord         => "Harpsichord",
            GeneralMidi::Vibraphone          => "Vibraphone",
            GeneralMidi::DrawbarOrgan        => "Drawbar Organ",
            GeneralMidi::ChurchOrgan         => "Church Organ",
            GeneralMidi::Accordion           => "Accordion",
            GeneralMidi::AcousticGuitarNylon => "Acoustic Guitar (nylon)",
            GeneralMidi::AcousticGuitarSteel => "Acoustic Guitar (steel)",
            GeneralMidi::ElectricGuitarJazz  => "Electric Guitar (jazz)",
            GeneralMidi::ElectricGuitarClean => "Electric Guitar (clean)",
            GeneralMidi::OverdrivenGuitar    => "Overdriven Guitar",
            GeneralMidi::DistortionGuitar    => "Distortion Guitar",
            GeneralMidi::StringEnsemble1     => "String Ensemble 1",
            GeneralMidi::ChoirAahs           => "Choir Aahs",
            GeneralMidi::Pad1NewAge          => "Pad 1 (New Age)",
            GeneralMidi::Pad2Warm            => "Pad 2 (Warm)",
            GeneralMidi::Banjo               => "Banjo",
        }
    }

    /// Config-file key, e.g. `"acoustic_guitar_steel"`.
    pub fn key(self) -> &'static str {
        match self {
            GeneralMidi::AcousticGrandPiano  => "piano",
            GeneralMidi::ElectricPiano1      => "electric_piano",
            GeneralMidi::Harpsichord         => "harpsichord",
            GeneralMidi::Vibraphone          => "vibraphone",
            GeneralMidi::DrawbarOrgan        => "organ",
            GeneralMidi::ChurchOrgan         => "church_organ",
            GeneralMidi::Accordion           => "accordion",
            GeneralMidi::AcousticGuitarNylon => "acoustic_guitar_nylon",
            GeneralMidi::AcousticGuitarSteel => "acoustic_guitar_steel",
            GeneralMidi::ElectricGuitarJazz  => "jazz_guitar",
            GeneralMidi::ElectricGuitarClean => "clean_guitar",
            GeneralMidi::OverdrivenGuitar    => "overdriven_guitar",
            GeneralMidi::DistortionGuitar    => "distortion_guitar",
            GeneralMidi::StringEnsemble1     => "strings",
            GeneralMidi::ChoirAahs           => "choir",
            GeneralMidi::Pad1NewAge          => "new_age_pad",
            GeneralMidi::Pad2Warm            => "warm_pad",
            GeneralMidi::Banjo               => "banjo",
        }
    }

    /// The named instrument `step` places away from `program`, wrapping
    /// around the list.  A program with no name counts from the nearest
    /// named one below it.
    pub fn cycle(program: u8, step: isize) -> GeneralMidi {
        let here = GeneralMidi::ALL.iter()
            .rposition(|g| g.program() <= program)
            .unwrap_or(0);
        let len = GeneralMidi::ALL.len() as isize;
        GeneralMidi::ALL[(here as isize + step).rem_euclid(len) as usize]
    }
}

impl fmt::Display for GeneralMidi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MidiError {
    #[error("unknown instrument {0:?} (use a name like \"acoustic_guitar_steel\" or a program 0–127)")]
    UnknownInstrument(String),
}

impl FromStr for GeneralMidi {
    type Err = MidiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let want = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        GeneralMidi::ALL.iter()
            .copied()
            .find(|g| g.key() == want)
            .ok_or_else(|| MidiError::UnknownInstrument(s.to_string()))
    }
}

/// Resolve an instrument given either by key or by raw program number.
pub fn parse_program(s: &str) -> Result<u8, MidiError> {
    if let Ok(n) = s.trim().parse::<u8>() {
        return if n <= 127 { Ok(n) } else { Err(MidiError::UnknownInstrument(s.to_string())) };
    }
    s.parse::<GeneralMidi>().map(GeneralMidi::program)
}

// ════════════════════════════════════════════════════════════════════════════
// Voicing — chord label → notes
// ════════════════════════════════════════════════════════════════════════════

/// Triad quality, as semitone offsets from the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
}

impl ChordQuality {
    pub fn intervals(self) -> [u8; 3] {
        match self {
            ChordQuality::Major => [0, 4, 7],
            ChordQuality::Minor => [0, 3, 7],
        }
    }
}

/// A concrete chord: root note plus quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Voicing {
    /// MIDI note number of the root.
    pub root:    u8,
    pub quality: ChordQuality,
}

impl Voicing {
    pub const fn new(root: u8, quality: ChordQuality) -> Self {
        Voicing { root, quality }
    }

    /// Root-position notes, clamped to 0–127.
    pub fn notes(&self) -> [u8; 3] {
        self.quality.intervals().map(|i| (self.root as u16 + i as u16).min(127) as u8)
    }

}

/// Chord identifier → voicing, lowest root around the guitar's middle.
const VOICINGS: [(&str, Voicing); 6] = [
    ("A_major", Voicing::new(57, ChordQuality::Major)),   // A3 C#4 E4
    ("A_minor", Voicing::new(57, ChordQuality::Minor)),   // A3 C4  E4
    ("C_major", Voicing::new(60, ChordQuality::Major)),   // C4 E4  G4
    ("D_major", Voicing::new(62, ChordQuality::Major)),   // D4 F#4 A4
    ("G_major", Voicing::new(55, ChordQuality::Major)),   // G3 B3  D4
    ("F_major", Voicing::new(53, ChordQuality::Major)),   // F3 A3  C4
];

/// Voicing for a chord identifier, or `None` if it is not one we know.
pub fn voicing_for(chord: &str) -> Option<Voicing> {
    VOICINGS.iter()
        .find(|(name, _)| *name == chord)
        .map(|(_, v)| *v)
}

// ════════════════════════════════════════════════════════════════════════════
// Channel messages
// ════════════════════════════════════════════════════════════════════════════

pub fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

pub fn note_off(channel: u8, note: u8) -> [u8; 3] {
    [0x80 | (channel & 0x0F), note & 0x7F, 0]
}

pub fn program_change(channel: u8, program: u8) -> [u8; 2] {
    [0xC0 | (channel & 0x0F), program & 0x7F]
}

/// Controller 123: release everything on the channel.
pub fn all_notes_off(channel: u8) -> [u8; 3] {
    [0xB0 | (channel & 0x0F), 123, 0]
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── voicings ─────────────────────────────────────────────────────────
    #[test]
    fn a_major_and_minor_share_a_root() {
        assert_eq!(voicing_for("A_major").unwrap().notes(), [57, 61, 64]);
        assert_eq!(voicing_for("A_minor").unwrap().notes(), [57, 60, 64]);
    }

    #[test]
    fn every_known_chord_is_a_triad_in_range() {
        for (name, voicing) in VOICINGS {
            assert_eq!(voicing_for(name), Some(voicing));
            let notes = voicing.notes();
            assert!(notes.windows(2).all(|w| w[0] < w[1]), "{name}");
            assert!(notes.iter().all(|&n| (48..=72).contains(&n)), "{name}");
        }
    }

    #[test]
    fn unknown_chord_has_no_voicing() {
        assert_eq!(voicing_for("B_flat"), None);
        assert_eq!(voicing_for(""), None);
        assert_eq!(voicing_for("a_major"), None);
    }

    #[test]
    fn notes_clamp_at_the_top() {
        assert_eq!(Voicing::new(125, ChordQuality::Major).notes(), [125, 127, 127]);
    }

    // ── messages ─────────────────────────────────────────────────────────
    #[test]
    fn message_status_bytes() {
        assert_eq!(note_on(0, 60, 100), [0x90, 60, 100]);
        assert_eq!(note_on(9, 60, 100), [0x99, 60, 100]);
        assert_eq!(note_off(3, 64), [0x83, 64, 0]);
        assert_eq!(program_change(1, 25), [0xC1, 25]);
        assert_eq!(all_notes_off(2), [0xB2, 123, 0]);
    }

    #[test]
    fn channel_and_data_are_masked() {
        assert_eq!(note_on(0x1F, 200, 255), [0x9F, 200 & 0x7F, 0x7F]);
    }

    // ── GeneralMidi ───────────────────────────────────────────────────────
    #[test]
    fn gm_program_numbers() {
        assert_eq!(GeneralMidi::AcousticGrandPiano.program(), 0);
        assert_eq!(GeneralMidi::AcousticGuitarSteel.program(), 25);
        assert_eq!(GeneralMidi::Banjo.program(), 105);
    }

    #[test]
    fn gm_keys_round_trip() {
        for g in GeneralMidi::ALL {
            assert_eq!(g.key().parse::<GeneralMidi>(), Ok(g));
        }
    }

    #[test]
    fn cycle_wraps_through_named_instruments() {
        assert_eq!(GeneralMidi::cycle(25, 1), GeneralMidi::ElectricGuitarJazz);
        assert_eq!(GeneralMidi::cycle(25, -1), GeneralMidi::AcousticGuitarNylon);
        assert_eq!(GeneralMidi::cycle(105, 1), GeneralMidi::AcousticGrandPiano);
        assert_eq!(GeneralMidi::cycle(0, -1), GeneralMidi::Banjo);
        // 40 (violin) sits between distortion guitar and strings
        assert_eq!(GeneralMidi::cycle(40, 1), GeneralMidi::StringEnsemble1);
        assert_eq!(GeneralMidi::cycle(40, -1), GeneralMidi::OverdrivenGuitar);
    }

    #[test]
    fn display_uses_the_gm_name() {
        assert_eq!(GeneralMidi::AcousticGuitarSteel.to_string(), "Acoustic Guitar (steel)");
        assert_eq!(GeneralMidi::Pad2Warm.to_string(), "Pad 2 (Warm)");
    }

    #[test]
    fn parse_program_accepts_names_and_numbers() {
        assert_eq!(parse_program("acoustic_guitar_steel"), Ok(25));
        assert_eq!(parse_program("Acoustic Guitar Nylon"), Ok(24));
        assert_eq!(parse_program("42"), Ok(42));
        assert!(parse_program("128").is_err());
        assert!(parse_program("kazoo").is_err());
    }
}
