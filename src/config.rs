//! Configuration management for the herald announcer

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

/// Default control/ingest API port
const DEFAULT_API_PORT: u16 = 18795;

/// Default deadline for speech engine initialization
const DEFAULT_START_TIMEOUT_SECS: u64 = 15;

/// Herald runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (contacts database, logs)
    pub data_dir: PathBuf,

    /// Control/ingest API server port
    pub api_port: u16,

    /// Speech synthesis configuration
    pub speech: SpeechConfig,

    /// Announcement formatting configuration
    pub announce: AnnounceConfig,

    /// Contact directory configuration
    pub directory: DirectoryConfig,

    /// Enable speaking as soon as the daemon starts
    pub enable_on_start: bool,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// TTS provider ("openai" or "elevenlabs")
    pub provider: String,

    /// `OpenAI` API key
    pub openai_api_key: Option<String>,

    /// `ElevenLabs` API key
    pub elevenlabs_api_key: Option<String>,

    /// TTS model (e.g. "tts-1", "eleven_monolingual_v1")
    pub model: String,

    /// TTS voice identifier
    pub voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub speed: f32,

    /// Deadline for engine initialization, in seconds
    pub start_timeout_secs: u64,
}

/// Announcement formatting configuration
#[derive(Debug, Clone)]
pub struct AnnounceConfig {
    /// Spoken template; `{sender}` and `{body}` are substituted
    pub template: String,

    /// Label spoken when a message carries no sender address
    pub unknown_sender: String,
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            template: "New message from {sender}. {body}".to_string(),
            unknown_sender: "an unknown sender".to_string(),
        }
    }
}

/// Contact directory configuration
#[derive(Debug, Clone, Default)]
pub struct DirectoryConfig {
    /// Path to a contacts TOML file (in-memory directory)
    pub contacts_file: Option<PathBuf>,

    /// Path to a contacts `SQLite` database
    pub contacts_db: Option<PathBuf>,
}

/// One entry in the contacts TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct ContactEntry {
    /// Display name spoken in place of the address
    pub name: String,
    /// Phone-number-like address
    pub number: String,
}

/// Contacts TOML file layout
#[derive(Debug, Deserialize)]
struct ContactsFile {
    #[serde(default)]
    contacts: Vec<ContactEntry>,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created
    pub fn load() -> Result<Self> {
        // Determine data directory (~/.local/share/omni/herald on Linux)
        let data_dir = directories::ProjectDirs::from("dev", "omni", "omni")
            .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("herald"));
        std::fs::create_dir_all(&data_dir)?;

        let api_port = std::env::var("HERALD_API_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_PORT);

        let speech = SpeechConfig {
            provider: std::env::var("HERALD_TTS_PROVIDER")
                .unwrap_or_else(|_| "openai".to_string()),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            elevenlabs_api_key: std::env::var("ELEVENLABS_API_KEY").ok(),
            model: std::env::var("HERALD_TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            voice: std::env::var("HERALD_TTS_VOICE").unwrap_or_else(|_| "alloy".to_string()),
            speed: std::env::var("HERALD_TTS_SPEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            start_timeout_secs: std::env::var("HERALD_START_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_START_TIMEOUT_SECS),
        };

        let announce = AnnounceConfig {
            template: std::env::var("HERALD_TEMPLATE")
                .unwrap_or_else(|_| AnnounceConfig::default().template),
            unknown_sender: std::env::var("HERALD_UNKNOWN_SENDER")
                .unwrap_or_else(|_| AnnounceConfig::default().unknown_sender),
        };

        let directory = DirectoryConfig {
            contacts_file: std::env::var("HERALD_CONTACTS_FILE")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    let default = data_dir.join("contacts.toml");
                    default.exists().then_some(default)
                }),
            contacts_db: std::env::var("HERALD_CONTACTS_DB").ok().map(PathBuf::from),
        };

        let enable_on_start = std::env::var("HERALD_ENABLE_ON_START")
            .is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        Ok(Self {
            data_dir,
            api_port,
            speech,
            announce,
            directory,
            enable_on_start,
        })
    }

    /// Load contact entries from the configured contacts file
    ///
    /// Missing or unparsable files are logged and yield an empty list; the
    /// daemon still runs, falling back to raw addresses.
    #[must_use]
    pub fn load_contacts(&self) -> Vec<ContactEntry> {
        let Some(path) = &self.directory.contacts_file else {
            return Vec::new();
        };

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ContactsFile>(&content) {
                Ok(file) => {
                    tracing::info!(
                        path = %path.display(),
                        count = file.contacts.len(),
                        "loaded contacts file"
                    );
                    file.contacts
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to parse contacts file, continuing without it"
                    );
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read contacts file"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_announce_template_has_placeholders() {
        let announce = AnnounceConfig::default();
        assert!(announce.template.contains("{sender}"));
        assert!(announce.template.contains("{body}"));
    }

    #[test]
    fn contacts_file_parses() {
        let raw = r#"
            [[contacts]]
            name = "Alice"
            number = "+15551234567"

            [[contacts]]
            name = "Bob"
            number = "555-867-5309"
        "#;
        let file: ContactsFile = toml::from_str(raw).unwrap();
        assert_eq!(file.contacts.len(), 2);
        assert_eq!(file.contacts[0].name, "Alice");
        assert_eq!(file.contacts[1].number, "555-867-5309");
    }

    #[test]
    fn contacts_file_defaults_empty() {
        let file: ContactsFile = toml::from_str("").unwrap();
        assert!(file.contacts.is_empty());
    }
}
