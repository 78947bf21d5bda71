//! Single-consumer worker queue
//!
//! Any number of producers enqueue arrival events; exactly one worker task
//! dequeues and fully processes one event before the next, so the speech
//! engine and announcement path are only ever driven from one logical thread
//! of control. Events are processed in enqueue order. Every event receives
//! its completion signal exactly once, including events that fail to decode
//! and events drained unprocessed during shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use super::announce::AnnouncementBuilder;
use super::decode::decode_batch;
use super::{ArrivalEvent, CompletionSink};
use crate::speech::SpeechEngineLifecycle;
use crate::{Error, Result};

/// One queued arrival event
struct WorkItem {
    event: ArrivalEvent,
}

/// Collaborators the worker drives for each item
struct WorkerContext {
    builder: AnnouncementBuilder,
    speech: Arc<SpeechEngineLifecycle>,
    sink: Arc<dyn CompletionSink>,
    draining: Arc<AtomicBool>,
}

/// Single-consumer queue feeding the pipeline worker
pub struct WorkerQueue {
    tx: std::sync::Mutex<Option<mpsc::UnboundedSender<WorkItem>>>,
    draining: Arc<AtomicBool>,
    worker: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl WorkerQueue {
    /// Spawn the worker task and return the queue handle
    #[must_use]
    pub fn spawn(
        builder: AnnouncementBuilder,
        speech: Arc<SpeechEngineLifecycle>,
        sink: Arc<dyn CompletionSink>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let draining = Arc::new(AtomicBool::new(false));

        let ctx = WorkerContext {
            builder,
            speech,
            sink,
            draining: Arc::clone(&draining),
        };
        let worker = tokio::spawn(run_worker(rx, ctx));

        Self {
            tx: std::sync::Mutex::new(Some(tx)),
            draining,
            worker: tokio::sync::Mutex::new(Some(worker)),
        }
    }

    /// Append an event to the queue
    ///
    /// Constant-time and safe under concurrent invocation; never blocks on
    /// I/O or on the worker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pipeline`] once the queue has been stopped.
    pub fn enqueue(&self, event: ArrivalEvent) -> Result<()> {
        let guard = self
            .tx
            .lock()
            .map_err(|e| Error::Pipeline(format!("queue lock poisoned: {e}")))?;

        let tx = guard
            .as_ref()
            .ok_or_else(|| Error::Pipeline("pipeline stopped".to_string()))?;

        tx.send(WorkItem { event })
            .map_err(|_| Error::Pipeline("pipeline stopped".to_string()))
    }

    /// Stop accepting events and shut the worker down
    ///
    /// The item being processed finishes; items still queued receive their
    /// completion signal without being processed. Idempotent.
    pub async fn stop(&self) {
        self.draining.store(true, Ordering::SeqCst);

        // Dropping the sender closes the channel once the backlog drains
        let tx = self.tx.lock().ok().and_then(|mut guard| guard.take());
        drop(tx);

        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "pipeline worker join failed");
            }
        }
    }
}

/// Worker loop: one item at a time, in arrival order
async fn run_worker(mut rx: mpsc::UnboundedReceiver<WorkItem>, ctx: WorkerContext) {
    tracing::debug!("pipeline worker started");
    let mut processed: u64 = 0;

    while let Some(item) = rx.recv().await {
        let sequence = item.event.sequence;

        if ctx.draining.load(Ordering::SeqCst) {
            tracing::debug!(sequence, "pipeline stopping, releasing event unprocessed");
            ctx.sink.complete(sequence);
            continue;
        }

        let messages = decode_batch(&item.event.payload);
        let mut spoken = 0usize;
        for message in &messages {
            let utterance = ctx.builder.build(message).await;
            if ctx.speech.try_speak(&utterance).await {
                spoken += 1;
            }
        }

        processed += 1;
        tracing::debug!(
            sequence,
            messages = messages.len(),
            spoken,
            "arrival event processed"
        );

        // The originator is released whatever the outcome above
        ctx.sink.complete(sequence);
    }

    tracing::debug!(events = processed, "pipeline worker terminated");
}
