//! Speech engine: capability traits, lifecycle state machine, and the
//! HTTP-synthesis adapter
//!
//! The engine is a capability consumed by the pipeline; the lifecycle owns
//! the single instance and all state transitions.

mod engine;
mod lifecycle;
mod playback;
mod remote;
mod synth;

pub use engine::{SpeechEngine, SpeechEngineProvider, SpeechPriority, SpeechUtterance};
pub use lifecycle::{EngineState, SpeechEngineLifecycle};
pub use playback::AudioPlayback;
pub use remote::{RemoteEngineProvider, RemoteSpeechEngine};
pub use synth::Synthesizer;
