//! Message-to-speech pipeline
//!
//! Arrival events from the external source are appended to a single-consumer
//! queue; one worker decodes each batch, resolves senders, and submits
//! utterances to the speech lifecycle. Ordering is end-to-end: events in
//! enqueue order, messages in decode order, utterances in that combined
//! order.

mod announce;
mod controller;
mod decode;
mod queue;

pub use announce::AnnouncementBuilder;
pub use controller::PipelineController;
pub use decode::{DecodedMessage, decode_batch};
pub use queue::WorkerQueue;

/// Caller-assigned token identifying one arrival event
pub type SequenceToken = u64;

/// One delivery unit from the external message source
///
/// Immutable once created; consumed exactly once by the worker. The payload
/// is opaque until decoded.
#[derive(Debug, Clone)]
pub struct ArrivalEvent {
    /// Raw batch payload
    pub payload: Vec<u8>,
    /// Token the originator ties resources to
    pub sequence: SequenceToken,
}

/// Completion signal back to an event's originator
///
/// Invoked exactly once per accepted event, whatever the processing outcome,
/// so the originator can release whatever it tied to the token.
pub trait CompletionSink: Send + Sync {
    /// Signal that processing of `token`'s event has finished
    fn complete(&self, token: SequenceToken);
}
