//! Top-level application wiring.
//!
//! ```text
//!   window thread                 gesture thread (current-thread tokio)
//!   ─────────────                 ─────────────────────────────────────
//!   Visualizer ──SimInput──▶ SimPose ◀── SimDetector ◀── GesturePipeline
//!        ▲                                                   │  │
//!        └──────────── watch<PipelineSnapshot> ◀─────────────┘  │ chord
//!                                                               ▼
//!                                                  ChordPlayer (MIDI thread)
//! ```
//!
//! Without a window the gesture loop runs on the calling thread until the
//! replay is exhausted or Ctrl-C.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use chord_gesture::{
    DetectionSession, DetectorLoader, FrameSource, GesturePipeline, PipelineSnapshot,
};
use chord_midi::GeneralMidi;

use crate::config::{Config, SourceKind};
use crate::error::AppError;
use crate::player::{ChordEvent, ChordPlayer, PlayerSettings};
use crate::replay::{ReplayLoader, ReplaySource};
use crate::sim::{spawn_sim_input, SimCamera, SimLoader, SimPose};
use crate::visualizer::{Visualizer, WindowKey};

/// Simulated model warm-up.
const SIM_LOAD_DELAY: Duration = Duration::from_millis(600);

/// Pause between failed detector loads.
const LOAD_RETRY: Duration = Duration::from_secs(2);

// ════════════════════════════════════════════════════════════════════════════
// Run options
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Run without the visualizer; needs a replay source.
    pub headless: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Source selection
// ════════════════════════════════════════════════════════════════════════════

/// Frame source, detector loader and (for the simulator) the pose cell.
pub struct HandInput {
    pub source: Box<dyn FrameSource>,
    pub loader: Box<dyn DetectorLoader>,
    pub pose:   Option<SimPose>,
}

pub fn build_input(cfg: &Config) -> Result<HandInput, AppError> {
    match cfg.source.kind {
        SourceKind::Sim => {
            let pose = SimPose::default();
            Ok(HandInput {
                source: Box::new(SimCamera::default()),
                loader: Box::new(SimLoader::new(pose.clone(), SIM_LOAD_DELAY)),
                pose:   Some(pose),
            })
        }
        SourceKind::Replay => {
            let path = cfg.source.replay_path.as_deref()
                .ok_or_else(|| AppError::Config("replay source without a path".into()))?;
            Ok(HandInput {
                source: Box::new(ReplaySource::open(path, cfg.source.replay_loop)?),
                loader: Box::new(ReplayLoader),
                pose:   None,
            })
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Async driver
// ════════════════════════════════════════════════════════════════════════════

/// Keep requesting the detector until it loads or shutdown is signalled.
pub async fn load_with_retry(session: &DetectionSession, mut shutdown: watch::Receiver<bool>) {
    loop {
        match session.request_load().await {
            Ok(status) => {
                info!(?status, "detector available");
                return;
            }
            Err(e) => warn!(error = %e, retry_in = ?LOAD_RETRY, "detector load failed"),
        }
        tokio::select! {
            _ = tokio::time::sleep(LOAD_RETRY) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() { return; }
            }
        }
        if *shutdown.borrow() { return; }
    }
}

/// Load the detector and run the gesture loop side by side.
pub async fn drive(
    pipeline: &mut GesturePipeline,
    session:  &DetectionSession,
    shutdown: watch::Receiver<bool>,
) -> PipelineSnapshot {
    let load = load_with_retry(session, shutdown.clone());
    let (_, snapshot) = tokio::join!(load, pipeline.run(shutdown));
    session.dispose();
    snapshot
}

fn runtime() -> Result<tokio::runtime::Runtime, AppError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
pub fn run(cfg: Config, opts: RunOptions) -> Result<(), AppError> {
    cfg.validate()?;
    if opts.headless && cfg.source.kind != SourceKind::Replay {
        return Err(AppError::Config("--no-window needs a replay source".into()));
    }

    let player = ChordPlayer::spawn(
        PlayerSettings {
            program:  cfg.program()?,
            velocity: cfg.midi.velocity,
            channel:  cfg.midi.channel,
            sustain:  Duration::from_millis(cfg.midi.sustain_ms),
        },
        cfg.midi.port_hint.clone(),
    );

    let input = build_input(&cfg)?;
    let session = Arc::new(DetectionSession::new(input.loader));
    let pipeline = GesturePipeline::new(Arc::clone(&session), input.source, Box::new(player.sink()))
        .with_thresholds(cfg.thresholds())
        .with_tick_interval(cfg.tick_interval());

    info!(
        source = ?cfg.source.kind,
        tick_ms = cfg.pipeline.tick_ms,
        instrument = %cfg.midi.instrument,
        "air chords starting"
    );

    if opts.headless {
        run_headless(pipeline, &session)?;
    } else {
        run_windowed(pipeline, session, input.pose, &player, &cfg)?;
    }

    player.shutdown();
    Ok(())
}

fn run_headless(mut pipeline: GesturePipeline, session: &DetectionSession) -> Result<(), AppError> {
    let rt = runtime()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let snapshot = rt.block_on(async {
        let driving = drive(&mut pipeline, session, shutdown_rx);
        tokio::pin!(driving);
        tokio::select! {
            snap = &mut driving => snap,
            interrupted = tokio::signal::ctrl_c() => {
                match interrupted {
                    Ok(()) => {
                        info!("interrupted");
                        shutdown_tx.send_replace(true);
                    }
                    Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
                }
                driving.await
            }
        }
    });

    info!(
        frames = snapshot.frames,
        chords = snapshot.emitted,
        held = ?snapshot.held.map(|c| c.as_str()),
        "replay finished"
    );
    Ok(())
}

fn run_windowed(
    mut pipeline: GesturePipeline,
    session:      Arc<DetectionSession>,
    pose:         Option<SimPose>,
    player:       &ChordPlayer,
    cfg:          &Config,
) -> Result<(), AppError> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let snapshots = pipeline.subscribe();

    // ── gesture thread ────────────────────────────────────────────────────
    let rt = runtime()?;
    let worker_session = Arc::clone(&session);
    let worker = thread::Builder::new()
        .name("gesture".into())
        .spawn(move || rt.block_on(drive(&mut pipeline, &worker_session, shutdown_rx)))
        .map_err(AppError::Runtime)?;

    // ── sim input translator ──────────────────────────────────────────────
    let (sim_tx, translator) = match pose {
        Some(pose) => {
            let (tx, handle) = spawn_sim_input(pose);
            (Some(tx), Some(handle))
        }
        None => (None, None),
    };

    let mut vis = Visualizer::new(sim_tx, cfg.pipeline.thresholds.min_keypoint_confidence)
        .map_err(AppError::Window)?;

    // ── main loop ─────────────────────────────────────────────────────────
    let mut status = String::from("Ready. Hold up a hand, or press 1-6.");
    let mut program = cfg.program()?;
    'frames: while vis.is_open() {
        for key in vis.poll_input() {
            match key {
                WindowKey::Quit => break 'frames,
                WindowKey::Instrument(step) => {
                    let instrument = GeneralMidi::cycle(program, step);
                    program = instrument.program();
                    player.set_instrument(program);
                    info!(%instrument, program, "instrument changed");
                    status = format!("Instrument: {instrument}");
                }
                WindowKey::Mute => {
                    player.release();
                    status = String::from("Muted.");
                }
            }
        }

        if let Some(ChordEvent { chord, notes }) = player.drain_events().pop() {
            status = format!("{chord}  notes {} {} {}", notes[0], notes[1], notes[2]);
        }

        let snap = snapshots.borrow().clone();
        vis.render(&snap, session.state(), &status);
    }

    // ── teardown ──────────────────────────────────────────────────────────
    shutdown_tx.send_replace(true);
    drop(vis);
    let snapshot = worker.join().map_err(|_| AppError::WorkerPanicked)?;
    if let Some(handle) = translator {
        let _ = handle.join();
    }
    info!(ticks = snapshot.ticks, chords = snapshot.emitted, "window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use chord_gesture::synthetic::synthetic_hand;
    use chord_gesture::{
        ChordLabel, ChordSink, DetectorError, HandDetector, RawHand, SessionState,
    };

    use crate::replay::encode_line;

    #[derive(Clone, Default)]
    struct Played(Arc<Mutex<Vec<String>>>);

    impl ChordSink for Played {
        fn play(&mut self, chord: &str) {
            self.0.lock().push(chord.to_string());
        }
    }

    fn line(label: Option<ChordLabel>) -> String {
        match label {
            Some(l) => encode_line(&[RawHand::from(&synthetic_hand(l.pose()))]).unwrap(),
            None => encode_line(&[]).unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replay_drives_chords_end_to_end() {
        use ChordLabel::*;
        let frames = [
            Some(AMajor), Some(AMajor), None, Some(AMajor),
            Some(AMinor), Some(AMinor), Some(GMajor), None, Some(FMajor),
        ];
        let text: String = frames.iter().map(|f| line(*f) + "\n").collect();

        let played = Played::default();
        let session = DetectionSession::new(Box::new(ReplayLoader));
        let session = Arc::new(session);
        let mut pipeline = GesturePipeline::new(
            Arc::clone(&session),
            Box::new(ReplaySource::from_text(&text, false)),
            Box::new(played.clone()),
        );
        let (_tx, rx) = watch::channel(false);

        let snapshot = drive(&mut pipeline, &session, rx).await;

        assert_eq!(*played.0.lock(), vec!["A_major", "A_minor", "G_major", "F_major"]);
        assert_eq!(snapshot.frames, frames.len() as u64);
        assert_eq!(snapshot.held, Some(FMajor));
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test(start_paused = true)]
    async fn bundled_demo_replay() {
        let played = Played::default();
        let session = Arc::new(DetectionSession::new(Box::new(ReplayLoader)));
        let source = ReplaySource::from_text(include_str!("../../demos/strum.jsonl"), false);
        let frames = source.len() as u64;
        let mut pipeline = GesturePipeline::new(Arc::clone(&session), Box::new(source), Box::new(played.clone()));
        let (_tx, rx) = watch::channel(false);

        let snapshot = drive(&mut pipeline, &session, rx).await;

        assert_eq!(
            *played.0.lock(),
            vec!["A_major", "A_minor", "C_major", "D_major", "G_major", "F_major", "C_major"]
        );
        assert_eq!(snapshot.frames, frames);
    }

    /// Fails the first `failures` loads.
    struct Flaky {
        calls:    Arc<AtomicUsize>,
        failures: usize,
    }

    struct Nothing;

    #[async_trait]
    impl HandDetector for Nothing {
        async fn detect(&self, _frame: &chord_gesture::Frame) -> Result<Vec<RawHand>, DetectorError> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl DetectorLoader for Flaky {
        async fn load(&self) -> Result<Box<dyn HandDetector>, DetectorError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err(DetectorError::Load("weights not found".into()))
            } else {
                Ok(Box::new(Nothing))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn load_is_retried_until_it_succeeds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let session = DetectionSession::new(Box::new(Flaky { calls: Arc::clone(&calls), failures: 2 }));
        let (_tx, rx) = watch::channel(false);

        load_with_retry(&session, rx).await;

        assert!(session.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_load_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let session = DetectionSession::new(Box::new(Flaky { calls: Arc::clone(&calls), failures: usize::MAX }));
        let (tx, rx) = watch::channel(false);

        let stop = async {
            tokio::time::sleep(LOAD_RETRY * 3 + Duration::from_millis(500)).await;
            tx.send_replace(true);
        };
        tokio::join!(load_with_retry(&session, rx), stop);

        assert!(!session.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn headless_needs_a_replay() {
        let err = run(Config::default(), RunOptions { headless: true }).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn sim_input_has_a_pose_cell() {
        let input = build_input(&Config::default()).unwrap();
        assert!(input.pose.is_some());
    }

    #[test]
    fn missing_replay_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.use_replay(dir.path().join("missing.jsonl"));
        assert!(matches!(build_input(&cfg), Err(AppError::Io { .. })));
    }
}
