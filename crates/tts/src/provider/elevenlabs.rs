use std::path::PathBuf;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use saythis_config::{ProviderKind, ProviderSettings};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TtsError},
    http_client::http_client,
    output::AudioOutput,
    types::{ProviderState, Usage},
};

use super::{SpeechProvider, not_ready, vendor_message};

const DEFAULT_ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io/v1";

const UNIT_RANGE: (f64, f64) = (0.0, 1.0);
const SPEED_RANGE: (f64, f64) = (0.7, 1.2);

/// `ElevenLabs` TTS provider
pub struct ElevenLabsProvider {
    client: Client,
    settings: ProviderSettings,
    output: AudioOutput,
    state: ProviderState,
    session: Option<Session>,
}

/// Everything needed to call the API, present only when ready
struct Session {
    api_key: SecretString,
    base_url: String,
    options: ElevenLabsOptions,
}

/// Tunables read from the provider settings
#[derive(Debug, Clone, Deserialize)]
struct ElevenLabsOptions {
    voice_id: String,
    model_id: String,
    output_format: String,
    #[serde(default)]
    voice_settings: Option<VoiceSettings>,
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
    #[serde(default)]
    style: f64,
    #[serde(default = "default_speed")]
    speed: f64,
    #[serde(default = "default_speaker_boost")]
    use_speaker_boost: bool,
}

const fn default_speed() -> f64 {
    1.0
}

const fn default_speaker_boost() -> bool {
    true
}

#[derive(Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_settings: Option<&'a VoiceSettings>,
}

#[derive(Deserialize)]
struct Subscription {
    character_count: u64,
    character_limit: u64,
}

impl ElevenLabsProvider {
    /// Build the provider from its settings
    ///
    /// Never fails; an empty credential or unreadable tunables leave the
    /// provider `Uninitialized` with the reason.
    pub fn initialize(settings: &ProviderSettings, output: AudioOutput) -> Self {
        let (state, session) = match Self::open_session(settings) {
            Ok(session) => (ProviderState::Ready, Some(session)),
            Err(reason) => {
                tracing::debug!(provider = ProviderKind::ElevenLabs.name(), %reason, "provider not initialized");
                (ProviderState::uninitialized(reason), None)
            }
        };

        Self {
            client: http_client(),
            settings: settings.clone(),
            output,
            state,
            session,
        }
    }

    fn open_session(settings: &ProviderSettings) -> std::result::Result<Session, String> {
        if !settings.is_configured() {
            return Err("no API key configured".to_owned());
        }

        let api_key = settings.resolved_credential().map_err(|e| e.to_string())?;
        if api_key.expose_secret().is_empty() {
            return Err("API key is empty after expansion".to_owned());
        }

        let options: ElevenLabsOptions = settings
            .options_as()
            .map_err(|e| format!("invalid ElevenLabs settings: {e}"))?;

        if !is_valid_voice_id(&options.voice_id) {
            return Err(format!("invalid ElevenLabs voice_id '{}'", options.voice_id));
        }

        let base_url = options
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ELEVENLABS_API_URL.to_string());

        Ok(Session {
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            options,
        })
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_else(|| not_ready(self.name(), &self.state))
    }

    async fn stream_to(&self, session: &Session, text: &str, path: &std::path::Path) -> Result<u64> {
        if let Some(voice_settings) = &session.options.voice_settings {
            voice_settings.validate()?;
        }

        let url = format!("{}/text-to-speech/{}", session.base_url, session.options.voice_id);

        tracing::debug!(
            "ElevenLabs TTS request: model={}, voice={}, format={}, input_len={}",
            session.options.model_id,
            session.options.voice_id,
            session.options.output_format,
            text.len(),
        );

        let body = ElevenLabsRequest {
            text,
            model_id: &session.options.model_id,
            voice_settings: session.options.voice_settings.as_ref(),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", session.options.output_format.as_str())])
            .header("xi-api-key", session.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("ElevenLabs request failed: {e}");
                TtsError::ConnectionError(format!("Failed to send request to ElevenLabs: {e}"))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            tracing::error!("ElevenLabs API error ({status}): {error_text}");

            return Err(TtsError::from_status(status.as_u16(), vendor_message(&error_text)));
        }

        let chunks = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                tracing::error!("ElevenLabs audio stream failed: {e}");
                TtsError::ConnectionError(format!("ElevenLabs audio stream interrupted: {e}"))
            })
        });

        self.output.write_stream(path, chunks).await
    }
}

impl VoiceSettings {
    /// Range checks applied before any request is sent
    fn validate(&self) -> Result<()> {
        check_range("stability", self.stability, UNIT_RANGE)?;
        check_range("similarity_boost", self.similarity_boost, UNIT_RANGE)?;
        check_range("style", self.style, UNIT_RANGE)?;
        check_range("speed", self.speed, SPEED_RANGE)
    }
}

fn check_range(name: &str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TtsError::InvalidRequest(format!(
            "voice_settings.{name} must be between {min} and {max}, got {value}"
        )))
    }
}

/// Voice IDs go into the URL path, so only plain ID characters are accepted
fn is_valid_voice_id(voice_id: &str) -> bool {
    !voice_id.is_empty()
        && voice_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    fn name(&self) -> &str {
        ProviderKind::ElevenLabs.name()
    }

    fn state(&self) -> &ProviderState {
        &self.state
    }

    fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    fn output_path(&self) -> PathBuf {
        self.output.path_for(&self.settings.file_extension)
    }

    async fn usage(&self) -> Result<Usage> {
        let session = self.session()?;
        let url = format!("{}/user/subscription", session.base_url);

        let response = self
            .client
            .get(&url)
            .header("xi-api-key", session.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("ElevenLabs subscription request failed: {e}");
                TtsError::ConnectionError(format!("Failed to send request to ElevenLabs: {e}"))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            tracing::error!("ElevenLabs subscription error ({status}): {error_text}");

            return Err(TtsError::from_status(status.as_u16(), vendor_message(&error_text)));
        }

        let subscription: Subscription = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse ElevenLabs subscription: {e}");
            TtsError::InternalError(Some(format!("Unexpected subscription response from ElevenLabs: {e}")))
        })?;

        Ok(Usage::Quota {
            used: subscription.character_count,
            limit: subscription.character_limit,
        })
    }

    async fn synthesize(&self, text: &str) -> Result<PathBuf> {
        let session = self.session()?;
        let path = self.output_path();

        match self.stream_to(session, text, &path).await {
            Ok(written) => {
                tracing::debug!("ElevenLabs TTS synthesis complete, {written} bytes");
                Ok(path)
            }
            Err(e) => {
                self.output.cleanup(&path).await;
                Err(e)
            }
        }
    }
}
