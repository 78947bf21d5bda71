//! Pipeline controller
//!
//! The entry point external code drives: arrival events go in, enable and
//! disable are forwarded to the speech lifecycle, and `stop` tears the
//! pipeline down. The controller owns the worker queue and the lifecycle;
//! nothing here is global state.

use std::sync::Arc;

use super::announce::AnnouncementBuilder;
use super::queue::WorkerQueue;
use super::{ArrivalEvent, CompletionSink, SequenceToken};
use crate::Result;
use crate::config::AnnounceConfig;
use crate::directory::ContactResolver;
use crate::speech::{EngineState, SpeechEngineLifecycle};

/// Front door of the message-to-speech pipeline
pub struct PipelineController {
    queue: WorkerQueue,
    speech: Arc<SpeechEngineLifecycle>,
}

impl PipelineController {
    /// Wire the pipeline: directory and announcement config feed the
    /// builder, the queue feeds the worker, completion signals flow to
    /// `sink`
    #[must_use]
    pub fn new(
        speech: Arc<SpeechEngineLifecycle>,
        directory: Arc<dyn ContactResolver>,
        announce: AnnounceConfig,
        sink: Arc<dyn CompletionSink>,
    ) -> Self {
        let builder = AnnouncementBuilder::new(directory, announce);
        let queue = WorkerQueue::spawn(builder, Arc::clone(&speech), sink);
        Self { queue, speech }
    }

    /// Accept one arrival event from the external source
    ///
    /// The completion sink fires exactly once for `sequence`, whatever the
    /// processing outcome. Safe to call concurrently; never blocks.
    ///
    /// # Errors
    ///
    /// Returns error once the pipeline has been stopped.
    pub fn on_arrival_event(&self, payload: Vec<u8>, sequence: SequenceToken) -> Result<()> {
        self.queue.enqueue(ArrivalEvent { payload, sequence })
    }

    /// Turn speech on; initialization completes in the background
    pub async fn enable(&self) {
        self.speech.enable().await;
    }

    /// Turn speech off, discarding pending speech
    pub async fn disable(&self) {
        self.speech.disable().await;
    }

    /// Current speech engine state
    pub async fn engine_state(&self) -> EngineState {
        self.speech.state().await
    }

    /// Whether the speech engine is ready
    pub async fn is_ready(&self) -> bool {
        self.speech.is_ready().await
    }

    /// Stop the pipeline: drain the queue, then disable speech
    pub async fn stop(&self) {
        self.queue.stop().await;
        self.speech.disable().await;
    }
}
