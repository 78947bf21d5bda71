//! HTTP speech synthesis

use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Synthesis provider backend
#[derive(Clone, Copy, Debug)]
enum SynthProvider {
    OpenAi,
    ElevenLabs,
}

/// Synthesizes speech from text over HTTP, returning MP3 bytes
pub struct Synthesizer {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
    provider: SynthProvider,
}

impl Synthesizer {
    /// Build a synthesizer from speech configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configured provider is unknown or its API key is
    /// missing
    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        let (provider, api_key) = match config.provider.as_str() {
            "openai" => (
                SynthProvider::OpenAi,
                config.openai_api_key.clone().ok_or_else(|| {
                    Error::Config("OPENAI_API_KEY required for openai TTS".to_string())
                })?,
            ),
            "elevenlabs" => (
                SynthProvider::ElevenLabs,
                config.elevenlabs_api_key.clone().ok_or_else(|| {
                    Error::Config("ELEVENLABS_API_KEY required for elevenlabs TTS".to_string())
                })?,
            ),
            other => {
                return Err(Error::Config(format!("unknown TTS provider: {other}")));
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice: config.voice.clone(),
            speed: config.speed,
            model: config.model.clone(),
            provider,
        })
    }

    /// Synthesize text to speech
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider rejects it
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.provider {
            SynthProvider::OpenAi => self.synthesize_openai(text).await,
            SynthProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
        }
    }

    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&SpeechRequest {
                model: &self.model,
                input: text,
                voice: &self.voice,
                speed: self.speed,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{}", self.voice);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&SpeechRequest {
                text,
                model_id: &self.model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
