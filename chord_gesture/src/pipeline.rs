//! The frame loop: sample → detect → classify → resolve → debounce → emit.
//!
//! One [`GesturePipeline`] runs on a single task.  Ticks are strictly
//! serialized (`tick` takes `&mut self` and the loop awaits each one), and
//! ticks that fall due while a detection is still pending are skipped
//! rather than queued.  Shutdown cancels the timer and drops any pending
//! detection, so a late result never reaches the gesture memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::chord::{resolve_chord, ChordLabel};
use crate::debounce::{GestureMemory, Transition};
use crate::finger::{FingerStates, Thresholds};
use crate::keypoint::Hand;
use crate::session::DetectionSession;
use crate::source::{ChordSink, FrameSource};

/// ~10 samples per second.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

// ════════════════════════════════════════════════════════════════════════════
// Tick outcome / snapshot
// ════════════════════════════════════════════════════════════════════════════

/// What a single tick did.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// No new frame was ready.
    NoFrame,
    /// Detector not loaded.
    DetectorUnavailable,
    /// The detector call failed.
    DetectorFailed,
    NoHand,
    /// The detector returned a landmark set of the wrong size.
    MalformedHand,
    /// A hand was classified but matched no chord.
    Unmatched(FingerStates),
    /// Matched the chord already held.
    Held(ChordLabel),
    /// Matched a new chord; an event was emitted.
    Emitted(ChordLabel),
}

/// Observable pipeline state for presentation.
#[derive(Clone, Debug, Default)]
pub struct PipelineSnapshot {
    /// Chord currently held by the debouncer.
    pub held:           Option<ChordLabel>,
    /// Most recent classified hand, if the last detection found one.
    pub hand:           Option<Hand>,
    pub fingers:        Option<FingerStates>,
    /// Chord matched on the last classified frame.
    pub last_match:     Option<ChordLabel>,
    pub ticks:          u64,
    pub frames:         u64,
    pub emitted:        u64,
    pub detector_ready: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// GesturePipeline
// ════════════════════════════════════════════════════════════════════════════

pub struct GesturePipeline {
    session:       Arc<DetectionSession>,
    source:        Box<dyn FrameSource>,
    sink:          Box<dyn ChordSink>,
    thresholds:    Thresholds,
    tick_interval: Duration,
    memory:        GestureMemory,
    last_sequence: Option<u64>,
    snapshot:      PipelineSnapshot,
    snapshot_tx:   watch::Sender<PipelineSnapshot>,
}

impl GesturePipeline {
    pub fn new(
        session: Arc<DetectionSession>,
        source:  Box<dyn FrameSource>,
        sink:    Box<dyn ChordSink>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(PipelineSnapshot::default());
        GesturePipeline {
            session,
            source,
            sink,
            thresholds:    Thresholds::default(),
            tick_interval: DEFAULT_TICK,
            memory:        GestureMemory::default(),
            last_sequence: None,
            snapshot:      PipelineSnapshot::default(),
            snapshot_tx,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Receiver for presentation; updated after every tick.
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn held(&self) -> Option<ChordLabel> {
        self.memory.held()
    }

    // ── one tick ──────────────────────────────────────────────────────────

    /// Run one sample of the pipeline.  Never fails; every problem ends the
    /// tick without touching the gesture memory.
    pub async fn tick(&mut self) -> TickOutcome {
        self.snapshot.ticks += 1;
        let outcome = self.sample().await;
        self.snapshot.held = self.memory.held();
        self.snapshot.detector_ready = self.session.is_ready();
        self.snapshot_tx.send_replace(self.snapshot.clone());
        trace!(?outcome, "tick");
        outcome
    }

    async fn sample(&mut self) -> TickOutcome {
        // frames stay with the source until there is something to run them through
        let Some(detector) = self.session.detector() else {
            return TickOutcome::DetectorUnavailable;
        };

        let frame = match self.source.poll_frame() {
            Some(f) if Some(f.sequence) != self.last_sequence => f,
            _ => return TickOutcome::NoFrame,
        };
        self.last_sequence = Some(frame.sequence);
        self.snapshot.frames += 1;

        let hands = match detector.detect(&frame).await {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, frame = frame.sequence, "hand detection failed");
                return TickOutcome::DetectorFailed;
            }
        };

        let Some(raw) = hands.first() else {
            trace!(frame = frame.sequence, "no hand");
            self.clear_hand();
            return TickOutcome::NoHand;
        };

        let hand = match Hand::from_raw(raw) {
            Ok(h) => h,
            Err(e) => {
                debug!(error = %e, frame = frame.sequence, "ignoring malformed hand");
                self.clear_hand();
                return TickOutcome::MalformedHand;
            }
        };

        let fingers = FingerStates::from_hand(&hand, &self.thresholds);
        let chord = resolve_chord(&fingers);
        debug!(frame = frame.sequence, %fingers, chord = ?chord, "classified hand");

        self.snapshot.hand = Some(hand);
        self.snapshot.fingers = Some(fingers);
        self.snapshot.last_match = chord;

        match self.memory.observe(chord) {
            Transition::Unmatched => TickOutcome::Unmatched(fingers),
            Transition::Held(label) => TickOutcome::Held(label),
            Transition::Emit(label) => {
                info!(chord = %label, %fingers, "chord change");
                self.snapshot.emitted += 1;
                self.sink.play(label.as_str());
                TickOutcome::Emitted(label)
            }
        }
    }

    fn clear_hand(&mut self) {
        self.snapshot.hand = None;
        self.snapshot.fingers = None;
        self.snapshot.last_match = None;
    }

    // ── the loop ──────────────────────────────────────────────────────────

    /// Tick at the configured cadence until `shutdown` flips to `true` (or
    /// its sender is dropped) or a finite source runs dry.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> PipelineSnapshot {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(tick_ms = self.tick_interval.as_millis() as u64, "gesture loop started");

        while !*shutdown.borrow() {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() { break; }
                    continue;
                }
                _ = interval.tick() => {}
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    debug!("shutdown during tick; discarding in-flight detection");
                    if changed.is_err() { break; }
                    continue;
                }
                _ = self.tick() => {}
            }

            if self.source.is_exhausted() {
                info!("frame source exhausted");
                break;
            }
        }

        info!(
            ticks = self.snapshot.ticks,
            emitted = self.snapshot.emitted,
            "gesture loop stopped"
        );
        self.snapshot.clone()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
