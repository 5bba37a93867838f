//! Chord debouncing: one event per transition into a new chord.
//!
//! Two states:
//!
//! ```text
//!            match(L) / emit                 match(L') / emit   (L' ≠ L)
//!   Idle ─────────────────────▶ Holding(L) ──────────────────▶ Holding(L')
//!                                 │    ▲
//!                                 └────┘ match(L) or no-match: no-op
//! ```
//!
//! A no-match observation never returns to `Idle`: showing A, dropping the
//! pose, then showing A again does not re-trigger A.

use crate::chord::ChordLabel;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GestureMemory {
    #[default]
    Idle,
    Holding(ChordLabel),
}

/// What an observation did to the memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// New chord; the caller should emit it.
    Emit(ChordLabel),
    /// Same chord as held.
    Held(ChordLabel),
    /// No chord this time; memory unchanged.
    Unmatched,
}

impl Transition {
    pub fn emitted(&self) -> Option<ChordLabel> {
        match *self {
            Transition::Emit(label) => Some(label),
            _ => None,
        }
    }
}

impl GestureMemory {
    /// Chord currently held, if any.
    pub fn held(&self) -> Option<ChordLabel> {
        match *self {
            GestureMemory::Idle => None,
            GestureMemory::Holding(label) => Some(label),
        }
    }

    /// Feed one classification result.
    pub fn observe(&mut self, chord: Option<ChordLabel>) -> Transition {
        let Some(label) = chord else {
            return Transition::Unmatched;
        };
        if self.held() == Some(label) {
            return Transition::Held(label);
        }
        *self = GestureMemory::Holding(label);
        Transition::Emit(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChordLabel::*;

    fn feed(memory: &mut GestureMemory, seq: &[Option<ChordLabel>]) -> Vec<ChordLabel> {
        seq.iter().filter_map(|&c| memory.observe(c).emitted()).collect()
    }

    #[test]
    fn starts_idle() {
        assert_eq!(GestureMemory::default().held(), None);
    }

    #[test]
    fn first_match_emits() {
        let mut m = GestureMemory::default();
        assert_eq!(m.observe(Some(CMajor)), Transition::Emit(CMajor));
        assert_eq!(m, GestureMemory::Holding(CMajor));
    }

    #[test]
    fn repeated_match_emits_once() {
        let mut m = GestureMemory::default();
        let emitted = feed(&mut m, &[Some(GMajor); 25]);
        assert_eq!(emitted, vec![GMajor]);
    }

    #[test]
    fn change_of_chord_emits_again() {
        let mut m = GestureMemory::default();
        let emitted = feed(&mut m, &[Some(AMajor), Some(AMajor), Some(AMinor), Some(AMinor)]);
        assert_eq!(emitted, vec![AMajor, AMinor]);
        assert_eq!(m.held(), Some(AMinor));
    }

    #[test]
    fn idle_stays_idle_on_no_match() {
        let mut m = GestureMemory::default();
        assert_eq!(m.observe(None), Transition::Unmatched);
        assert_eq!(m, GestureMemory::Idle);
    }

    #[test]
    fn no_match_is_sticky() {
        let mut m = GestureMemory::default();
        m.observe(Some(DMajor));
        assert_eq!(m.observe(None), Transition::Unmatched);
        assert_eq!(m.held(), Some(DMajor));
    }

    #[test]
    fn same_chord_after_gap_does_not_retrigger() {
        let mut m = GestureMemory::default();
        let emitted = feed(&mut m, &[Some(AMajor), None, None, Some(AMajor)]);
        assert_eq!(emitted, vec![AMajor]);
    }

    #[test]
    fn different_chord_after_gap_triggers() {
        let mut m = GestureMemory::default();
        let emitted = feed(&mut m, &[Some(AMajor), None, Some(FMajor), None, Some(AMajor)]);
        assert_eq!(emitted, vec![AMajor, FMajor, AMajor]);
    }
}
