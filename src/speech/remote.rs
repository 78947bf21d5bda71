//! Remote speech engine
//!
//! Combines the HTTP synthesizer with a playback pump task. `speak` appends
//! to an internal FIFO and returns immediately; the pump synthesizes and
//! plays one utterance at a time, so the pipeline worker never waits on
//! playback. INTERRUPT flushes the FIFO before queueing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::engine::{SpeechEngine, SpeechEngineProvider, SpeechPriority};
use super::playback::AudioPlayback;
use super::synth::Synthesizer;
use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Shared state between the engine handle and its pump task
struct PumpState {
    pending: Mutex<VecDeque<String>>,
    wakeup: Notify,
    closed: AtomicBool,
}

/// Speech engine backed by an HTTP synthesizer and local playback
pub struct RemoteSpeechEngine {
    state: Arc<PumpState>,
    pump: Option<tokio::task::JoinHandle<()>>,
}

impl RemoteSpeechEngine {
    /// Spawn the playback pump and return the engine handle
    #[must_use]
    pub fn spawn(synth: Synthesizer, playback: AudioPlayback) -> Self {
        let state = Arc::new(PumpState {
            pending: Mutex::new(VecDeque::new()),
            wakeup: Notify::new(),
            closed: AtomicBool::new(false),
        });

        let pump_state = Arc::clone(&state);
        let pump = tokio::spawn(run_pump(pump_state, synth, playback));

        Self {
            state,
            pump: Some(pump),
        }
    }

    fn push(&self, text: String, priority: SpeechPriority) -> Result<()> {
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(Error::Speech("engine is shut down".to_string()));
        }

        {
            let mut pending = self
                .state
                .pending
                .lock()
                .map_err(|e| Error::Speech(format!("queue lock poisoned: {e}")))?;
            if priority == SpeechPriority::Interrupt {
                let flushed = pending.len();
                pending.clear();
                if flushed > 0 {
                    tracing::debug!(flushed, "flushed queued utterances");
                }
            }
            pending.push_back(text);
        }

        self.state.wakeup.notify_one();
        Ok(())
    }
}

#[async_trait]
impl SpeechEngine for RemoteSpeechEngine {
    async fn speak(&mut self, text: &str, priority: SpeechPriority) -> Result<()> {
        self.push(text.to_string(), priority)
    }

    async fn shutdown(&mut self) {
        self.state.closed.store(true, Ordering::SeqCst);
        if let Ok(mut pending) = self.state.pending.lock() {
            let discarded = pending.len();
            pending.clear();
            if discarded > 0 {
                tracing::debug!(discarded, "discarded queued utterances on shutdown");
            }
        }
        self.state.wakeup.notify_one();

        if let Some(pump) = self.pump.take() {
            // In-flight playback runs on the blocking pool and drains on its
            // own; the pump itself exits promptly once woken
            pump.abort();
            let _ = pump.await;
        }
        tracing::debug!("speech engine shut down");
    }
}

impl Drop for RemoteSpeechEngine {
    fn drop(&mut self) {
        self.state.closed.store(true, Ordering::SeqCst);
        if let Some(pump) = &self.pump {
            pump.abort();
        }
    }
}

/// Pump loop: pop, synthesize, play, one utterance at a time
async fn run_pump(state: Arc<PumpState>, synth: Synthesizer, playback: AudioPlayback) {
    let playback = Arc::new(playback);
    loop {
        if state.closed.load(Ordering::SeqCst) {
            break;
        }

        let next = state.pending.lock().ok().and_then(|mut q| q.pop_front());
        let Some(text) = next else {
            state.wakeup.notified().await;
            continue;
        };

        let audio = match synth.synthesize(&text).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(error = %e, "synthesis failed, skipping utterance");
                continue;
            }
        };

        let player = Arc::clone(&playback);
        let played =
            tokio::task::spawn_blocking(move || player.play_mp3(&audio)).await;
        match played {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "playback failed"),
            Err(e) => tracing::warn!(error = %e, "playback task failed"),
        }
    }
}

/// Builds [`RemoteSpeechEngine`] instances
///
/// `start` is where initialization latency lives: the synthesizer is
/// validated and the output device resolved before the engine is handed to
/// the lifecycle.
pub struct RemoteEngineProvider {
    speech: SpeechConfig,
}

impl RemoteEngineProvider {
    /// Create a provider from speech configuration
    #[must_use]
    pub const fn new(speech: SpeechConfig) -> Self {
        Self { speech }
    }
}

#[async_trait]
impl SpeechEngineProvider for RemoteEngineProvider {
    async fn start(&self) -> Result<Box<dyn SpeechEngine>> {
        let synth = Synthesizer::from_config(&self.speech)?;

        // Device probing touches the audio host; keep it off the runtime
        let playback = tokio::task::spawn_blocking(AudioPlayback::new)
            .await
            .map_err(|e| Error::Speech(format!("playback init task failed: {e}")))??;

        Ok(Box::new(RemoteSpeechEngine::spawn(synth, playback)))
    }
}
