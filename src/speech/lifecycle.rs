//! Speech engine lifecycle management
//!
//! Owns the single engine instance and the DISABLED/STARTING/READY/
//! SHUTTING_DOWN state machine. One lock guards every state transition and
//! the engine handle itself, so `disable` can never interleave with a
//! submission: a `try_speak` holding the lock finishes before teardown
//! begins. Engine initialization runs in a background task; a start that
//! completes after a later `enable` or `disable` is discarded rather than
//! installed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::engine::{SpeechEngine, SpeechEngineProvider, SpeechUtterance};

/// Lifecycle state of the speech engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No engine; speech is off
    Disabled,
    /// Initialization in flight
    Starting,
    /// Engine installed and accepting utterances
    Ready,
    /// Teardown in progress
    ShuttingDown,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Starting => write!(f, "starting"),
            Self::Ready => write!(f, "ready"),
            Self::ShuttingDown => write!(f, "shutting down"),
        }
    }
}

/// Engine handle and state, guarded together
struct Slot {
    state: EngineState,
    engine: Option<Box<dyn SpeechEngine>>,
    /// Bumped on every enable/disable; a start task only installs its engine
    /// if the epoch it captured is still current
    epoch: u64,
}

/// Owns the speech engine instance and its state machine
pub struct SpeechEngineLifecycle {
    provider: Arc<dyn SpeechEngineProvider>,
    slot: Arc<Mutex<Slot>>,
    start_timeout: Duration,
}

impl SpeechEngineLifecycle {
    /// Create a lifecycle in the disabled state
    #[must_use]
    pub fn new(provider: Arc<dyn SpeechEngineProvider>, start_timeout: Duration) -> Self {
        Self {
            provider,
            slot: Arc::new(Mutex::new(Slot {
                state: EngineState::Disabled,
                engine: None,
                epoch: 0,
            })),
            start_timeout,
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> EngineState {
        self.slot.lock().await.state
    }

    /// Whether the engine is installed and accepting utterances
    pub async fn is_ready(&self) -> bool {
        self.state().await == EngineState::Ready
    }

    /// Turn speech on
    ///
    /// Idempotent when already ready. A call during STARTING cancels the
    /// in-flight start and begins a fresh one, guarding against rapid
    /// double-toggle. Initialization runs in the background; failure or
    /// timeout logs and reverts to DISABLED.
    pub async fn enable(&self) {
        let epoch = {
            let mut slot = self.slot.lock().await;
            match slot.state {
                EngineState::Ready => {
                    tracing::debug!("speech already enabled");
                    return;
                }
                EngineState::Starting => {
                    tracing::info!("restarting in-flight speech engine start");
                }
                EngineState::Disabled | EngineState::ShuttingDown => {
                    tracing::info!("starting speech engine");
                }
            }
            slot.epoch += 1;
            slot.state = EngineState::Starting;
            slot.epoch
        };

        let provider = Arc::clone(&self.provider);
        let slot = Arc::clone(&self.slot);
        let deadline = self.start_timeout;
        tokio::spawn(async move {
            let outcome = tokio::time::timeout(deadline, provider.start()).await;
            let mut guard = slot.lock().await;
            let current = guard.epoch == epoch && guard.state == EngineState::Starting;
            match outcome {
                Ok(Ok(mut engine)) => {
                    if current {
                        guard.engine = Some(engine);
                        guard.state = EngineState::Ready;
                        tracing::info!("speech engine ready");
                    } else {
                        // Lost the race to a later enable/disable; never install
                        drop(guard);
                        tracing::debug!("discarding speech engine from superseded start");
                        engine.shutdown().await;
                    }
                }
                Ok(Err(e)) => {
                    if current {
                        guard.state = EngineState::Disabled;
                    }
                    tracing::error!(error = %e, "speech engine initialization failed");
                }
                Err(_) => {
                    if current {
                        guard.state = EngineState::Disabled;
                    }
                    tracing::error!(
                        timeout_secs = deadline.as_secs(),
                        "speech engine initialization timed out"
                    );
                }
            }
        });
    }

    /// Turn speech off
    ///
    /// No-op when already disabled; no engine interaction in that case.
    /// Otherwise the engine is released under the state lock, after any
    /// in-flight submission has finished.
    pub async fn disable(&self) {
        let mut slot = self.slot.lock().await;
        if slot.state == EngineState::Disabled {
            tracing::debug!("speech already disabled");
            return;
        }

        slot.epoch += 1;
        slot.state = EngineState::ShuttingDown;
        if let Some(mut engine) = slot.engine.take() {
            engine.shutdown().await;
        }
        slot.state = EngineState::Disabled;
        tracing::info!("speech disabled");
    }

    /// Submit an utterance if the engine is ready
    ///
    /// Returns false immediately when the engine is not READY or the
    /// submission fails; the caller treats false as "nothing was spoken" and
    /// moves on. Never blocks waiting for playback.
    pub async fn try_speak(&self, utterance: &SpeechUtterance) -> bool {
        let mut slot = self.slot.lock().await;
        if slot.state != EngineState::Ready {
            return false;
        }

        let Some(engine) = slot.engine.as_mut() else {
            debug_assert!(false, "READY state with no engine installed");
            return false;
        };

        match engine.speak(&utterance.text, utterance.priority).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "speech submission failed");
                false
            }
        }
    }
}
