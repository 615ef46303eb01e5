//! Google Cloud Text-to-Speech provider
//!
//! The credential is the path to a service-account JSON key. Each synthesis
//! signs a short-lived RS256 assertion with the key, exchanges it for an
//! OAuth access token, and calls `text:synthesize`. The API answers with the
//! whole clip base64-encoded in one response; there is no streaming and no
//! usage endpoint.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use jwt_compact::{AlgorithmExt, Claims, Header, TimeOptions, alg::Rsa};
use reqwest::Client;
use rsa::{RsaPrivateKey, pkcs8::DecodePrivateKey};
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

const DEFAULT_GOOGLE_TTS_API_URL: &str = "https://texttospeech.googleapis.com/v1";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const SPEAKING_RATE_RANGE: (f64, f64) = (0.25, 2.0);
const PITCH_RANGE: (f64, f64) = (-20.0, 20.0);
const VOLUME_GAIN_RANGE: (f64, f64) = (-96.0, 16.0);
const VOICE_GENDERS: [&str; 4] = ["SSML_VOICE_GENDER_UNSPECIFIED", "MALE", "FEMALE", "NEUTRAL"];
const AUDIO_ENCODINGS: [&str; 3] = ["MP3", "LINEAR16", "OGG_OPUS"];

/// Google Cloud TTS provider
pub struct GoogleCloudProvider {
    client: Client,
    settings: ProviderSettings,
    output: AudioOutput,
    state: ProviderState,
    session: Option<Session>,
}

struct Session {
    credentials: Credentials,
    base_url: String,
    options: GoogleCloudOptions,
}

enum Credentials {
    ServiceAccount(ServiceAccount),
    AccessToken(SecretString),
}

struct ServiceAccount {
    client_email: String,
    private_key_id: Option<String>,
    token_uri: String,
    key: RsaPrivateKey,
}

/// Fields read from a service-account key file
#[derive(Deserialize)]
struct ServiceAccountFile {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GoogleCloudOptions {
    language_code: String,
    voice_name: String,
    voice_gender: String,
    audio_encoding: String,
    speaking_rate: f64,
    pitch: f64,
    volume_gain_db: f64,
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig<'a>,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
    ssml_gender: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig<'a> {
    audio_encoding: &'a str,
    speaking_rate: f64,
    pitch: f64,
    volume_gain_db: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

impl GoogleCloudProvider {
    /// Build the provider from its settings
    ///
    /// The credential must name a readable service-account key file; any
    /// problem with it leaves the provider `Uninitialized`.
    pub fn initialize(settings: &ProviderSettings, output: AudioOutput) -> Self {
        let session = load_service_account(settings)
            .and_then(|account| Session::new(settings, Credentials::ServiceAccount(account)));

        Self::from_session(settings, output, session)
    }

    /// Build a provider that authenticates with a pre-issued OAuth access
    /// token instead of a service-account key
    pub fn with_access_token(settings: &ProviderSettings, token: SecretString, output: AudioOutput) -> Self {
        let session = Session::new(settings, Credentials::AccessToken(token));

        Self::from_session(settings, output, session)
    }

    fn from_session(
        settings: &ProviderSettings,
        output: AudioOutput,
        session: std::result::Result<Session, String>,
    ) -> Self {
        let (state, session) = match session {
            Ok(session) => (ProviderState::Ready, Some(session)),
            Err(reason) => {
                tracing::debug!(provider = ProviderKind::GoogleCloud.name(), %reason, "provider not initialized");
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

    async fn synthesize_to(&self, session: &Session, text: &str, path: &Path) -> Result<()> {
        session.options.validate()?;

        let token = session.credentials.access_token(&self.client).await?;
        let url = format!("{}/text:synthesize", session.base_url);

        tracing::debug!(
            "Google Cloud TTS request: voice={}, language={}, encoding={}, input_len={}",
            session.options.voice_name,
            session.options.language_code,
            session.options.audio_encoding,
            text.len(),
        );

        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &session.options.language_code,
                name: &session.options.voice_name,
                ssml_gender: &session.options.voice_gender,
            },
            audio_config: AudioConfig {
                audio_encoding: &session.options.audio_encoding,
                speaking_rate: session.options.speaking_rate,
                pitch: session.options.pitch,
                volume_gain_db: session.options.volume_gain_db,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Google Cloud TTS request failed: {e}");
                TtsError::ConnectionError(format!("Failed to send request to Google Cloud TTS: {e}"))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            tracing::error!("Google Cloud TTS API error ({status}): {error_text}");

            return Err(TtsError::from_status(status.as_u16(), vendor_message(&error_text)));
        }

        let payload: SynthesizeResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Google Cloud TTS response: {e}");
            TtsError::InternalError(Some(format!("Unexpected response from Google Cloud TTS: {e}")))
        })?;

        let audio = STANDARD.decode(payload.audio_content.as_bytes()).map_err(|e| {
            tracing::error!("Google Cloud TTS returned invalid base64 audio: {e}");
            TtsError::InternalError(Some(format!("Google Cloud TTS returned undecodable audio: {e}")))
        })?;

        self.output.write_all(path, &audio).await?;

        tracing::debug!("Google Cloud TTS synthesis complete, {} bytes", audio.len());

        Ok(())
    }
}

impl Session {
    fn new(settings: &ProviderSettings, credentials: Credentials) -> std::result::Result<Self, String> {
        let options: GoogleCloudOptions = settings
            .options_as()
            .map_err(|e| format!("invalid Google Cloud settings: {e}"))?;

        let base_url = options
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_GOOGLE_TTS_API_URL.to_string());

        Ok(Self {
            credentials,
            base_url: base_url.trim_end_matches('/').to_owned(),
            options,
        })
    }
}

impl GoogleCloudOptions {
    /// Range and enum checks applied before any request is sent
    fn validate(&self) -> Result<()> {
        check_range("speaking_rate", self.speaking_rate, SPEAKING_RATE_RANGE)?;
        check_range("pitch", self.pitch, PITCH_RANGE)?;
        check_range("volume_gain_db", self.volume_gain_db, VOLUME_GAIN_RANGE)?;

        if !VOICE_GENDERS.contains(&self.voice_gender.as_str()) {
            return Err(TtsError::InvalidRequest(format!(
                "voice_gender must be one of {}, got '{}'",
                VOICE_GENDERS.join(", "),
                self.voice_gender
            )));
        }

        if !AUDIO_ENCODINGS.contains(&self.audio_encoding.as_str()) {
            return Err(TtsError::InvalidRequest(format!(
                "audio_encoding must be one of {}, got '{}'",
                AUDIO_ENCODINGS.join(", "),
                self.audio_encoding
            )));
        }

        Ok(())
    }
}

fn check_range(name: &str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TtsError::InvalidRequest(format!(
            "{name} must be between {min} and {max}, got {value}"
        )))
    }
}

impl Credentials {
    async fn access_token(&self, client: &Client) -> Result<SecretString> {
        match self {
            Self::AccessToken(token) => Ok(SecretString::from(token.expose_secret().to_owned())),
            Self::ServiceAccount(account) => account.exchange(client).await,
        }
    }
}

impl ServiceAccount {
    /// Trade a signed assertion for an access token
    async fn exchange(&self, client: &Client) -> Result<SecretString> {
        let assertion = self.assertion()?;

        let response = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Google OAuth token request failed: {e}");
                TtsError::ConnectionError(format!("Failed to reach the Google token endpoint: {e}"))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            tracing::error!("Google OAuth token error ({status}): {error_text}");

            return Err(TtsError::AuthenticationFailed(vendor_message(&error_text)));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Google OAuth token response: {e}");
            TtsError::AuthenticationFailed(format!("Unexpected token response from Google: {e}"))
        })?;

        Ok(SecretString::from(token.access_token))
    }

    fn assertion(&self) -> Result<String> {
        let mut header = Header::empty();
        if let Some(key_id) = &self.private_key_id {
            header = header.with_key_id(key_id.clone());
        }

        let claims = Claims::new(AssertionClaims {
            iss: &self.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.token_uri,
        })
        .set_duration_and_issuance(&TimeOptions::default(), chrono::Duration::minutes(60));

        Rsa::rs256().token(&header, &claims, &self.key).map_err(|e| {
            tracing::error!("Failed to sign Google service account assertion: {e}");
            TtsError::AuthenticationFailed(format!("Failed to sign service account assertion: {e}"))
        })
    }
}

/// Read and parse the service-account key named by the credential
fn load_service_account(settings: &ProviderSettings) -> std::result::Result<ServiceAccount, String> {
    if !settings.is_configured() {
        return Err("no service account JSON file configured".to_owned());
    }

    let path = settings.resolved_credential().map_err(|e| e.to_string())?;
    let path = Path::new(path.expose_secret());

    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read service account file {}: {e}", path.display()))?;

    let file: ServiceAccountFile = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid service account file {}: {e}", path.display()))?;

    let key = RsaPrivateKey::from_pkcs8_pem(&file.private_key)
        .map_err(|e| format!("invalid private key in {}: {e}", path.display()))?;

    Ok(ServiceAccount {
        client_email: file.client_email,
        private_key_id: file.private_key_id,
        token_uri: file.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_owned()),
        key,
    })
}

#[async_trait]
impl SpeechProvider for GoogleCloudProvider {
    fn name(&self) -> &str {
        ProviderKind::GoogleCloud.name()
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

    /// Google Cloud TTS is pay-per-use with no usage endpoint
    async fn usage(&self) -> Result<Usage> {
        Ok(Usage::Unavailable)
    }

    async fn synthesize(&self, text: &str) -> Result<PathBuf> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| not_ready(self.name(), &self.state))?;
        let path = self.output_path();

        match self.synthesize_to(session, text, &path).await {
            Ok(()) => Ok(path),
            Err(e) => {
                self.output.cleanup(&path).await;
                Err(e)
            }
        }
    }
}
