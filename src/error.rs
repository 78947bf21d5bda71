//! Error types for the herald announcer

use thiserror::Error;

/// Result type alias for herald operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the herald announcer
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech engine error
    #[error("speech error: {0}")]
    Speech(String),

    /// Audio device/playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// Text-to-speech synthesis error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Contact directory error
    #[error("directory error: {0}")]
    Directory(String),

    /// Pipeline error (worker queue, controller)
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
