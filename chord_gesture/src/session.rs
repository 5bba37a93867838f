//! Detector lifecycle: load once, share everywhere.
//!
//! ```text
//!   Uninitialized ──load()──▶ Loading ──ok──▶ Ready
//!         ▲                      │
//!         └────────err───────────┘   (retriable)
//! ```
//!
//! Concurrent `load()` calls share a single underlying
//! [`DetectorLoader::load`]; the callers that arrive while it runs wait for
//! its outcome instead of starting another.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{DetectorError, SessionError};
use crate::source::{DetectorLoader, HandDetector};

/// Result of a load request that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// This call loaded the detector.
    Loaded,
    /// The detector was ready already, or another caller's load finished.
    AlreadyLoaded,
    /// A load is running; returned only by [`DetectionSession::request_load`].
    StillLoading,
}

/// Coarse lifecycle state for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Ready,
}

type LoadOutcome = Option<Result<(), DetectorError>>;

enum Start {
    Ready,
    Wait(watch::Receiver<LoadOutcome>),
    Lead(watch::Sender<LoadOutcome>),
}

enum Slot {
    Uninitialized,
    Loading(watch::Receiver<LoadOutcome>),
    Ready(Arc<dyn HandDetector>),
}

// ════════════════════════════════════════════════════════════════════════════
// DetectionSession
// ════════════════════════════════════════════════════════════════════════════

pub struct DetectionSession {
    loader: Box<dyn DetectorLoader>,
    slot:   Mutex<Slot>,
}

impl DetectionSession {
    pub fn new(loader: Box<dyn DetectorLoader>) -> Self {
        DetectionSession { loader, slot: Mutex::new(Slot::Uninitialized) }
    }

    pub fn state(&self) -> SessionState {
        match &*self.slot.lock() {
            Slot::Uninitialized => SessionState::Uninitialized,
            Slot::Loading(_)    => SessionState::Loading,
            Slot::Ready(_)      => SessionState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// The loaded detector, if any.
    pub fn detector(&self) -> Option<Arc<dyn HandDetector>> {
        match &*self.slot.lock() {
            Slot::Ready(d) => Some(Arc::clone(d)),
            _ => None,
        }
    }

    /// Load the detector, or wait for the load already in progress.
    pub async fn load(&self) -> Result<LoadStatus, SessionError> {
        let start = {
            let mut slot = self.slot.lock();
            match &*slot {
                Slot::Ready(_) => Start::Ready,
                Slot::Loading(rx) => Start::Wait(rx.clone()),
                Slot::Uninitialized => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Slot::Loading(rx);
                    Start::Lead(tx)
                }
            }
        };

        match start {
            Start::Ready => Ok(LoadStatus::AlreadyLoaded),
            Start::Wait(rx) => self.wait_for_load(rx).await,
            Start::Lead(tx) => {
                info!("loading hand detector");
                let mut guard = LoadGuard { session: self, tx, finished: false };
                let result = self.loader.load().await;
                guard.finish(result)
            }
        }
    }

    /// Like [`load`](Self::load), but returns `StillLoading` immediately
    /// instead of waiting on somebody else's load.
    pub async fn request_load(&self) -> Result<LoadStatus, SessionError> {
        if self.state() == SessionState::Loading {
            debug!("detector load already in progress");
            return Ok(LoadStatus::StillLoading);
        }
        self.load().await
    }

    /// Drop the detector; a later `load()` starts from scratch.
    pub fn dispose(&self) {
        let mut slot = self.slot.lock();
        if let Slot::Ready(_) = &*slot {
            *slot = Slot::Uninitialized;
            info!("hand detector disposed");
        }
    }

    async fn wait_for_load(&self, mut rx: watch::Receiver<LoadOutcome>) -> Result<LoadStatus, SessionError> {
        debug!("waiting for in-flight detector load");
        let outcome = match rx.wait_for(|o| o.is_some()).await {
            Ok(o) => o.clone(),
            Err(_) => Some(Err(DetectorError::Load("load abandoned".into()))),
        };
        match outcome {
            Some(Ok(())) => Ok(LoadStatus::AlreadyLoaded),
            Some(Err(e)) => Err(e.into()),
            None => Err(DetectorError::Unavailable.into()),
        }
    }
}

/// Resets the slot if the loading future is dropped before it finishes.
struct LoadGuard<'a> {
    session:  &'a DetectionSession,
    tx:       watch::Sender<LoadOutcome>,
    finished: bool,
}

impl LoadGuard<'_> {
    fn finish(&mut self, result: Result<Box<dyn HandDetector>, DetectorError>) -> Result<LoadStatus, SessionError> {
        self.finished = true;
        let mut slot = self.session.slot.lock();
        match result {
            Ok(detector) => {
                *slot = Slot::Ready(Arc::from(detector));
                drop(slot);
                info!("hand detector ready");
                self.tx.send_replace(Some(Ok(())));
                Ok(LoadStatus::Loaded)
            }
            Err(e) => {
                *slot = Slot::Uninitialized;
                drop(slot);
                warn!(error = %e, "hand detector failed to load");
                self.tx.send_replace(Some(Err(e.clone())));
                Err(e.into())
            }
        }
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.session.slot.lock() = Slot::Uninitialized;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
