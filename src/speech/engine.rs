//! Speech engine capability traits

use async_trait::async_trait;

use crate::Result;

/// Queue mode for one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechPriority {
    /// Queue behind whatever is already speaking
    Append,
    /// Flush queued speech and speak immediately
    Interrupt,
}

/// One unit of text submitted to the speech engine for audible output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechUtterance {
    /// Text to speak
    pub text: String,
    /// Queue mode
    pub priority: SpeechPriority,
}

impl SpeechUtterance {
    /// Create an utterance that queues behind in-progress speech
    #[must_use]
    pub fn append(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: SpeechPriority::Append,
        }
    }
}

/// Trait for a running speech engine instance
///
/// Implementations queue internally; `speak` returns once the utterance is
/// accepted, not once it has been heard.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Submit text for audible output
    async fn speak(&mut self, text: &str, priority: SpeechPriority) -> Result<()>;

    /// Release the engine; queued speech is discarded
    async fn shutdown(&mut self);
}

/// Trait for constructing speech engine instances
///
/// `start` carries the real initialization latency (audio device, remote
/// synthesizer); the lifecycle bounds it with a deadline.
#[async_trait]
pub trait SpeechEngineProvider: Send + Sync {
    /// Build and initialize a fresh engine
    async fn start(&self) -> Result<Box<dyn SpeechEngine>>;
}
