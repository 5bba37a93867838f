//! Real-time MIDI chord playback thread.
//!
//! Chord labels arrive over a channel; each one releases whatever is still
//! sounding and strikes the new triad.  A chord that is not replaced is
//! released after the sustain time.  Labels with no voicing are ignored.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use chord_gesture::ChordSink;
use chord_midi::{all_notes_off, note_off, note_on, program_change, voicing_for};

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand — sent to the playback thread
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum PlayerCommand {
    /// Strike a chord by identifier (`"A_minor"`, …).
    Chord(String),
    /// Release whatever is sounding.
    Release,
    /// Change instrument (MIDI program 0–127).
    SetInstrument(u8),
    /// Release everything and terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// ChordEvent — sent back for the status line
// ════════════════════════════════════════════════════════════════════════════

/// Emitted for each chord struck.
#[derive(Clone, Debug, PartialEq)]
pub struct ChordEvent {
    pub chord: String,
    pub notes: [u8; 3],
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut: Send {
    fn send(&mut self, message: &[u8]);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn send(&mut self, message: &[u8]) {
        if let Err(e) = self.conn.send(message) {
            debug!(error = %e, "midi send failed");
        }
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

pub struct NullOut;

impl MidiOut for NullOut {
    fn send(&mut self, _message: &[u8]) {}
}

// ════════════════════════════════════════════════════════════════════════════
// open_midi_output — enumerate ports and pick one
// ════════════════════════════════════════════════════════════════════════════

/// Open the port matching `hint`, else the first softsynth-looking port,
/// else the first port.  Falls back to [`NullOut`] with a warning.
pub fn open_midi_output(hint: Option<&str>) -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("air_chords") {
        Ok(m)  => m,
        Err(e) => {
            warn!(error = %e, "MIDI init failed; chords will be silent");
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("no MIDI output ports; chords will be silent \
               (try `fluidsynth` or `timidity -iA` on Linux)");
        return Box::new(NullOut);
    }

    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();
    let port_idx = pick_port(&names, hint);
    info!(port = %names[port_idx], "opening MIDI port");

    match midi_out.connect(&ports[port_idx], "air-chords-out") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            warn!(error = %e, "MIDI connect failed; chords will be silent");
            Box::new(NullOut)
        }
    }
}

/// Index of the preferred port among `names` (non-empty).
fn pick_port(names: &[String], hint: Option<&str>) -> usize {
    let find = |pred: &dyn Fn(&str) -> bool| {
        names.iter().position(|n| pred(&n.to_lowercase()))
    };
    hint.map(str::to_lowercase)
        .and_then(|h| find(&|n: &str| n.contains(h.as_str())))
        .or_else(|| find(&|n: &str| {
            ["fluid", "timidity", "microsoft", "gm", "synth"].iter().any(|s| n.contains(s))
        }))
        .unwrap_or(0)
}

// ════════════════════════════════════════════════════════════════════════════
// ChordPlayer — handle to the playback thread
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSettings {
    pub program:  u8,
    pub velocity: u8,
    pub channel:  u8,
    pub sustain:  Duration,
}

pub struct ChordPlayer {
    cmd_tx:   Sender<PlayerCommand>,
    event_rx: Receiver<ChordEvent>,
    handle:   Option<thread::JoinHandle<()>>,
}

impl ChordPlayer {
    /// Spawn the playback thread on a real MIDI port.
    pub fn spawn(settings: PlayerSettings, port_hint: Option<String>) -> Self {
        Self::spawn_with(settings, move || open_midi_output(port_hint.as_deref()))
    }

    /// Spawn with a caller-supplied output; `open` runs on the new thread.
    pub fn spawn_with<F>(settings: PlayerSettings, open: F) -> Self
    where
        F: FnOnce() -> Box<dyn MidiOut> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            player_thread(open(), settings, cmd_rx, event_tx);
        });
        ChordPlayer { cmd_tx, event_rx, handle: Some(handle) }
    }

    /// Silence the sounding chord, if any.
    pub fn release(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Release);
    }

    /// Switch program; the next chord sounds on it.
    pub fn set_instrument(&self, program: u8) {
        let _ = self.cmd_tx.send(PlayerCommand::SetInstrument(program));
    }

    /// A [`ChordSink`] feeding this player; usable from another thread.
    pub fn sink(&self) -> PlayerSink {
        PlayerSink { cmd_tx: self.cmd_tx.clone() }
    }

    /// Drain any pending chord events (non-blocking).
    pub fn drain_events(&self) -> Vec<ChordEvent> {
        self.event_rx.try_iter().collect()
    }

    /// Release everything and wait for the thread to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("MIDI player thread panicked");
            }
        }
    }
}

impl Drop for ChordPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sends chord changes to a [`ChordPlayer`].
#[derive(Clone)]
pub struct PlayerSink {
    cmd_tx: Sender<PlayerCommand>,
}

impl ChordSink for PlayerSink {
    fn play(&mut self, chord: &str) {
        let _ = self.cmd_tx.send(PlayerCommand::Chord(chord.to_string()));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn player_thread(
    mut midi:  Box<dyn MidiOut>,
    settings:  PlayerSettings,
    cmd_rx:    Receiver<PlayerCommand>,
    event_tx:  Sender<ChordEvent>,
) {
    let PlayerSettings { program, velocity, channel, sustain } = settings;
    let mut sounding: Option<([u8; 3], Instant)> = None;

    midi.send(&program_change(channel, program));

    loop {
        let cmd = match sounding {
            Some((_, until)) => {
                match cmd_rx.recv_timeout(until.saturating_duration_since(Instant::now())) {
                    Ok(cmd) => cmd,
                    Err(RecvTimeoutError::Timeout) => PlayerCommand::Release,
                    Err(RecvTimeoutError::Disconnected) => PlayerCommand::Quit,
                }
            }
            None => cmd_rx.recv().unwrap_or(PlayerCommand::Quit),
        };

        match cmd {
            PlayerCommand::Chord(label) => {
                let Some(voicing) = voicing_for(&label) else {
                    debug!(chord = %label, "no voicing; ignored");
                    continue;
                };
                release(midi.as_mut(), channel, &mut sounding);
                let notes = voicing.notes();
                for &n in &notes {
                    midi.send(&note_on(channel, n, velocity));
                }
                debug!(chord = %label, ?notes, "strum");
                sounding = Some((notes, Instant::now() + sustain));
                let _ = event_tx.send(ChordEvent { chord: label, notes });
            }
            PlayerCommand::Release => release(midi.as_mut(), channel, &mut sounding),
            PlayerCommand::SetInstrument(p) => {
                midi.send(&program_change(channel, p));
            }
            PlayerCommand::Quit => {
                release(midi.as_mut(), channel, &mut sounding);
                midi.send(&all_notes_off(channel));
                return;
            }
        }
    }
}

fn release(midi: &mut dyn MidiOut, channel: u8, sounding: &mut Option<([u8; 3], Instant)>) {
    if let Some((notes, _)) = sounding.take() {
        for &n in &notes {
            midi.send(&note_off(channel, n));
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
