//! Herald - spoken announcer for incoming text messages
//!
//! Herald listens for message-arrival events, resolves each sender against a
//! contact directory, and speaks the messages aloud through a text-to-speech
//! engine. Processing is serialized through one background worker so the
//! stateful engine is never driven concurrently; a toggleable lifecycle
//! starts and tears the engine down on demand.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 Front door (HTTP)                 │
//! │    /messages ingest   │   /speech enable/disable  │
//! └───────────┬───────────────────────┬──────────────┘
//!             │                       │
//! ┌───────────▼───────────┐ ┌─────────▼──────────────┐
//! │   PipelineController  │ │  SpeechEngineLifecycle  │
//! │  WorkerQueue (1 task) │ │  DISABLED ⇄ STARTING ⇄  │
//! │  decode → announce ───┼─▶  READY → SHUTTING_DOWN  │
//! └───────────┬───────────┘ └─────────┬──────────────┘
//!             │                       │
//! ┌───────────▼───────────┐ ┌─────────▼──────────────┐
//! │    ContactResolver    │ │  Synthesizer + playback │
//! └───────────────────────┘ └────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod daemon;
pub mod directory;
pub mod error;
pub mod pipeline;
pub mod speech;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use pipeline::{
    ArrivalEvent, CompletionSink, DecodedMessage, PipelineController, SequenceToken, WorkerQueue,
    decode_batch,
};
pub use speech::{
    EngineState, SpeechEngine, SpeechEngineLifecycle, SpeechEngineProvider, SpeechPriority,
    SpeechUtterance,
};
