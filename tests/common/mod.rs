//! Shared test doubles for pipeline and speech tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use herald::pipeline::{CompletionSink, SequenceToken};
use herald::speech::{
    EngineState, SpeechEngine, SpeechEngineLifecycle, SpeechEngineProvider, SpeechPriority,
};
use herald::{Error, Result};

/// Speech engine that records every submission
pub struct RecordingEngine {
    log: Arc<Mutex<Vec<(String, SpeechPriority)>>>,
    shutdowns: Arc<AtomicUsize>,
}

#[async_trait]
impl SpeechEngine for RecordingEngine {
    async fn speak(&mut self, text: &str, priority: SpeechPriority) -> Result<()> {
        self.log
            .lock()
            .expect("utterance log poisoned")
            .push((text.to_string(), priority));
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider handing out [`RecordingEngine`]s, instrumented with counters
pub struct RecordingProvider {
    /// Utterances submitted to any engine from this provider, in order
    pub log: Arc<Mutex<Vec<(String, SpeechPriority)>>>,
    /// Completed `start` calls
    pub starts: Arc<AtomicUsize>,
    /// Engine shutdowns (stale or disabled)
    pub shutdowns: Arc<AtomicUsize>,
    start_delay: Duration,
    fail: AtomicBool,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// A provider whose `start` takes `delay` to complete
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            starts: Arc::new(AtomicUsize::new(0)),
            shutdowns: Arc::new(AtomicUsize::new(0)),
            start_delay: delay,
            fail: AtomicBool::new(false),
        }
    }

    /// A provider whose `start` always fails
    pub fn failing() -> Self {
        let provider = Self::new();
        provider.fail.store(true, Ordering::SeqCst);
        provider
    }

    /// Utterance texts submitted so far
    pub fn texts(&self) -> Vec<String> {
        self.log
            .lock()
            .expect("utterance log poisoned")
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }
}

impl Default for RecordingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechEngineProvider for RecordingProvider {
    async fn start(&self) -> Result<Box<dyn SpeechEngine>> {
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Speech("provider configured to fail".to_string()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingEngine {
            log: Arc::clone(&self.log),
            shutdowns: Arc::clone(&self.shutdowns),
        }))
    }
}

/// Completion sink recording tokens in signal order
pub struct RecordingSink {
    completed: Mutex<Vec<SequenceToken>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Tokens signalled so far, in order
    pub fn tokens(&self) -> Vec<SequenceToken> {
        self.completed.lock().expect("sink log poisoned").clone()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSink for RecordingSink {
    fn complete(&self, token: SequenceToken) {
        self.completed
            .lock()
            .expect("sink log poisoned")
            .push(token);
    }
}

/// Poll `condition` until it holds or two seconds elapse
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll until the lifecycle reaches `state` or two seconds elapse
pub async fn wait_state(lifecycle: &SpeechEngineLifecycle, state: EngineState) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if lifecycle.state().await == state {
            return true;
        }
        if tokio::time::Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
